//! Table shape and index policy per dataset variant.
//!
//! # Responsibility
//! - Describe the fixed column set shared by every dataset table.
//! - Render the variant-specific DDL (unique vs. plain key index).
//!
//! # Invariants
//! - Column names and types never differ between variants.
//! - Table names are validated identifiers before they reach any SQL text,
//!   and are always quoted there so keywords such as `order` work.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_TABLE_NAME_LEN: usize = 64;

static TABLE_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern should compile")
});

/// Addressing discipline of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// At most one row per key.
    Map,
    /// Any number of rows per key.
    Bag,
}

impl DatasetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Bag => "bag",
        }
    }
}

/// How the `key` column is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPolicy {
    /// `UNIQUE (key)` table constraint.
    Unique,
    /// Plain secondary index on `key`.
    NonUnique,
}

/// Schema strategy chosen when a dataset is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub kind: DatasetKind,
    pub index_policy: IndexPolicy,
}

impl Schema {
    pub fn map() -> Self {
        Self {
            kind: DatasetKind::Map,
            index_policy: IndexPolicy::Unique,
        }
    }

    pub fn bag() -> Self {
        Self {
            kind: DatasetKind::Bag,
            index_policy: IndexPolicy::NonUnique,
        }
    }

    pub fn for_kind(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::Map => Self::map(),
            DatasetKind::Bag => Self::bag(),
        }
    }

    /// Renders the statements creating `table`.
    ///
    /// The caller must have validated `table` with [`is_valid_table_name`].
    /// With `if_not_exists` every statement is a no-op on an existing table.
    pub fn create_sql(&self, table: &str, if_not_exists: bool) -> String {
        let guard = if if_not_exists { "IF NOT EXISTS " } else { "" };
        let key_constraint = match self.index_policy {
            IndexPolicy::Unique => ",\n    UNIQUE (key)",
            IndexPolicy::NonUnique => "",
        };

        let mut sql = format!(
            "CREATE TABLE {guard}\"{table}\" (
    sequence_id INTEGER PRIMARY KEY AUTOINCREMENT,
    key BLOB NOT NULL,
    value BLOB,
    created_at INTEGER,
    updated_at INTEGER{key_constraint}
);"
        );

        if self.index_policy == IndexPolicy::NonUnique {
            sql.push_str(&format!(
                "\nCREATE INDEX {guard}\"{table}_key_idx\" ON \"{table}\" (key);"
            ));
        }
        sql
    }
}

/// Returns whether `name` can be spliced into SQL as a table identifier.
pub fn is_valid_table_name(name: &str) -> bool {
    name.len() <= MAX_TABLE_NAME_LEN
        && TABLE_NAME_PATTERN.is_match(name)
        && !name.to_ascii_lowercase().starts_with("sqlite_")
}
