//! Opaque-value record store on SQLite tables.
//!
//! Values are encoded by [`codec`] and stored under byte keys in a Map
//! (one row per key) or Bag (many rows per key) [`dataset::Dataset`]. The
//! [`object`] layer turns records into editable entities through the narrow
//! [`storage::Storage`] contract.

pub mod codec;
pub mod dataset;
pub mod db;
pub mod logging;
pub mod model;
pub mod object;
pub mod storage;

pub use codec::{decode, encode, CodecError, CodecResult};
pub use dataset::{Dataset, DatasetError, DatasetKind, DatasetResult, IndexPolicy, Schema};
pub use db::{open_db, open_db_in_memory, open_db_with, DbError, JournalMode, OpenOptions};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status, LoggingConfig};
pub use model::attributes::Attributes;
pub use model::record::{Record, SequenceId, Timestamp};
pub use model::term::Term;
pub use object::entity::Entity;
pub use object::model::{MissingPolicy, Model};
pub use storage::{BasicStorage, Storage};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
