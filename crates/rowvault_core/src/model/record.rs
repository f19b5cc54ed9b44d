//! Decoded dataset row.

use serde::{Deserialize, Serialize};

/// Engine-assigned row identity, monotonic per table.
pub type SequenceId = i64;

/// Unix epoch milliseconds.
pub type Timestamp = i64;

/// One stored row with its value decoded as `V`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<V> {
    /// Physical row identity; the only column that is globally unique.
    pub sequence_id: SequenceId,
    /// Application key, stored as raw bytes.
    pub key: Vec<u8>,
    /// Decoded value. `None` when the column is NULL.
    pub value: Option<V>,
    /// Set once at insertion.
    pub created_at: Option<Timestamp>,
    /// Set on every successful mutation; `None` until the first one.
    pub updated_at: Option<Timestamp>,
}

impl<V> Record<V> {
    /// Returns whether the row was mutated after insertion.
    pub fn is_modified(&self) -> bool {
        self.updated_at.is_some()
    }
}
