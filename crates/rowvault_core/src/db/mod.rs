//! SQLite connection bootstrap and backend error classification.
//!
//! # Responsibility
//! - Open and configure SQLite connections used by datasets.
//! - Map the few backend failures the dataset layer understands to a kind.
//!
//! # Invariants
//! - Returned connections have a non-zero busy timeout, so lock contention
//!   waits instead of failing immediately.
//! - Classification reads structured result codes; message text is inspected
//!   only where SQLite exposes no dedicated code (`table already exists`).

use rusqlite::ffi;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

mod open;

pub use open::{open_db, open_db_in_memory, open_db_with};

pub type DbResult<T> = Result<T, DbError>;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidOption(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidOption(message) => write!(f, "invalid connection option: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidOption(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// SQLite journal mode applied when a connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// Readers do not block the writer; needs a file-backed database.
    #[default]
    Wal,
    /// Rollback journal, SQLite's own default.
    Delete,
}

impl JournalMode {
    fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
        }
    }
}

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenOptions {
    /// How long a statement waits for a competing lock before `SQLITE_BUSY`.
    pub busy_timeout_ms: u64,
    /// Ignored for in-memory databases.
    pub journal_mode: JournalMode,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
        }
    }
}

impl OpenOptions {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    fn validate(&self) -> DbResult<()> {
        if self.busy_timeout_ms == 0 {
            return Err(DbError::InvalidOption(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Backend failures with a dataset-level meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFailure {
    /// A `UNIQUE` constraint rejected the write.
    UniqueViolation,
    /// `CREATE TABLE` hit an existing table.
    TableExists,
    /// Anything else; callers must propagate it unchanged.
    Other,
}

/// Classifies one SQLite error.
pub fn classify_sqlite_error(err: &rusqlite::Error) -> BackendFailure {
    // Prepare-time failures (DDL included) arrive as `SqlInputError`.
    let (failure, message) = match err {
        rusqlite::Error::SqliteFailure(failure, message) => (failure, message.as_deref()),
        rusqlite::Error::SqlInputError { error, msg, .. } => (error, Some(msg.as_str())),
        _ => return BackendFailure::Other,
    };

    if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
        return BackendFailure::UniqueViolation;
    }

    // SQLite reports an existing table as plain SQLITE_ERROR.
    if failure.extended_code == ffi::SQLITE_ERROR
        && message.is_some_and(|text| text.starts_with("table") && text.ends_with("already exists"))
    {
        return BackendFailure::TableExists;
    }

    BackendFailure::Other
}
