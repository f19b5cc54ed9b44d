//! Dataset engine: opaque-value records over one SQLite table.
//!
//! # Responsibility
//! - Create the backing table for a Map or Bag dataset.
//! - Provide put/get/get_all/delete/set over encoded values.
//! - Provide the locked read-modify-write used for atomic updates.
//!
//! # Invariants
//! - A Map table never holds two rows with the same key.
//! - `created_at` is written by inserts only; `updated_at` by updates only.
//! - A transaction opened here touches the rows of exactly one key.
//! - Only unique violations and existing tables are reinterpreted; every
//!   other backend error is returned as-is inside [`DatasetError::Db`].
//!
//! # Locking
//! `set_with` runs in a `BEGIN IMMEDIATE` transaction. SQLite grants the
//! write lock at `BEGIN`, so a competing transform waits (up to the
//! connection busy timeout) until the holder commits, then reads the
//! committed value. The lock covers the whole database file, not one key:
//! while it is held, `put`, `set`, `delete` and table creation on any key
//! or table wait as well, and fail with `SQLITE_BUSY` inside
//! [`DatasetError::Db`] once the busy timeout elapses. Readers are not
//! blocked in WAL mode. It cannot deadlock because it is taken up front
//! rather than upgraded from a read lock.

pub mod schema;

use crate::codec::{self, CodecError};
use crate::db::{classify_sqlite_error, BackendFailure, DbError};
use crate::model::record::{Record, SequenceId};
use log::{debug, info, warn};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub use schema::{is_valid_table_name, DatasetKind, IndexPolicy, Schema};

/// Millisecond Unix time evaluated by SQLite; constant within one statement.
const NOW_MS_SQL: &str = "CAST(ROUND((julianday('now') - 2440587.5) * 86400000.0) AS INTEGER)";

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors returned by dataset operations.
#[derive(Debug)]
pub enum DatasetError {
    /// Insert collided with an existing key on a Map dataset.
    DuplicateKey(Vec<u8>),
    /// `set`/`set_with` matched no rows.
    NotFound(Vec<u8>),
    /// `create_table` found the table already present.
    DuplicateTable(String),
    /// Table name is not a plain SQL identifier.
    InvalidTableName(String),
    /// Value could not be encoded, or stored bytes could not be decoded.
    Codec(CodecError),
    /// Any other backend failure, unchanged.
    Db(DbError),
}

impl DatasetError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey(key) => write!(f, "duplicate key: {}", key.escape_ascii()),
            Self::NotFound(key) => write!(f, "no record for key: {}", key.escape_ascii()),
            Self::DuplicateTable(table) => write!(f, "table already exists: {table}"),
            Self::InvalidTableName(table) => write!(f, "invalid table name `{table}`"),
            Self::Codec(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DatasetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DuplicateKey(_) => None,
            Self::NotFound(_) => None,
            Self::DuplicateTable(_) => None,
            Self::InvalidTableName(_) => None,
            Self::Codec(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<CodecError> for DatasetError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

impl From<DbError> for DatasetError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for DatasetError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQL text rendered once per dataset.
#[derive(Debug)]
struct Statements {
    insert: String,
    select_first: String,
    select_all: String,
    select_for_update: String,
    update_by_key: String,
    update_by_sequence: String,
    delete_by_key: String,
    count_by_key: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        let columns = "sequence_id, key, value, created_at, updated_at";
        Self {
            insert: format!(
                "INSERT INTO \"{table}\" (key, value, created_at)
                 VALUES (?1, ?2, {NOW_MS_SQL})
                 RETURNING sequence_id, created_at;"
            ),
            select_first: format!(
                "SELECT {columns} FROM \"{table}\"
                 WHERE key = ?1
                 ORDER BY sequence_id ASC
                 LIMIT 1;"
            ),
            select_all: format!(
                "SELECT {columns} FROM \"{table}\"
                 WHERE key = ?1
                 ORDER BY sequence_id ASC;"
            ),
            select_for_update: format!(
                "SELECT sequence_id, value FROM \"{table}\"
                 WHERE key = ?1
                 ORDER BY sequence_id ASC;"
            ),
            update_by_key: format!(
                "UPDATE \"{table}\"
                 SET value = ?1,
                     updated_at = {NOW_MS_SQL}
                 WHERE key = ?2;"
            ),
            update_by_sequence: format!(
                "UPDATE \"{table}\"
                 SET value = ?1,
                     updated_at = {NOW_MS_SQL}
                 WHERE sequence_id = ?2;"
            ),
            delete_by_key: format!("DELETE FROM \"{table}\" WHERE key = ?1;"),
            count_by_key: format!("SELECT COUNT(*) FROM \"{table}\" WHERE key = ?1;"),
        }
    }
}

/// One Map or Bag table on a borrowed connection.
///
/// Holds no mutable state of its own; concurrent callers each use their own
/// connection and their own `Dataset` over the same table.
#[derive(Debug)]
pub struct Dataset<'conn> {
    conn: &'conn Connection,
    name: String,
    schema: Schema,
    sql: Statements,
}

impl<'conn> Dataset<'conn> {
    /// Binds a dataset to `name`; does not touch the database.
    pub fn try_new(
        conn: &'conn Connection,
        name: impl Into<String>,
        schema: Schema,
    ) -> DatasetResult<Self> {
        let name = name.into();
        if !is_valid_table_name(&name) {
            return Err(DatasetError::InvalidTableName(name));
        }
        let sql = Statements::for_table(&name);
        Ok(Self {
            conn,
            name,
            schema,
            sql,
        })
    }

    pub fn map(conn: &'conn Connection, name: impl Into<String>) -> DatasetResult<Self> {
        Self::try_new(conn, name, Schema::map())
    }

    pub fn bag(conn: &'conn Connection, name: impl Into<String>) -> DatasetResult<Self> {
        Self::try_new(conn, name, Schema::bag())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn kind(&self) -> DatasetKind {
        self.schema.kind
    }

    pub fn table_exists(&self) -> DatasetResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [self.name.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    /// Creates the table and its index unless they already exist.
    pub fn ensure_table(&self) -> DatasetResult<()> {
        self.execute_ddl(true)
    }

    /// Creates the table, failing with [`DatasetError::DuplicateTable`] if
    /// it exists.
    pub fn create_table(&self) -> DatasetResult<()> {
        self.execute_ddl(false)
    }

    fn execute_ddl(&self, if_not_exists: bool) -> DatasetResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Err(err) = tx.execute_batch(&self.schema.create_sql(&self.name, if_not_exists)) {
            if classify_sqlite_error(&err) == BackendFailure::TableExists {
                return Err(DatasetError::DuplicateTable(self.name.clone()));
            }
            return Err(err.into());
        }
        tx.commit()?;

        info!(
            "event=dataset_create_table module=dataset status=ok table={} kind={} if_not_exists={}",
            self.name,
            self.schema.kind.as_str(),
            if_not_exists
        );
        Ok(())
    }

    /// Inserts a new row holding `value`.
    ///
    /// Map datasets reject an existing key with [`DatasetError::DuplicateKey`];
    /// Bag datasets always insert.
    pub fn put<V: Serialize>(&self, key: &[u8], value: V) -> DatasetResult<Record<V>> {
        let started_at = Instant::now();
        let blob = codec::encode(&value)?;

        let mut stmt = self.conn.prepare_cached(&self.sql.insert)?;
        let inserted = stmt.query_row(params![key, blob], |row| {
            Ok((row.get::<_, SequenceId>(0)?, row.get::<_, Option<i64>>(1)?))
        });
        let (sequence_id, created_at) = match inserted {
            Ok(columns) => columns,
            Err(err) => {
                if classify_sqlite_error(&err) == BackendFailure::UniqueViolation {
                    warn!(
                        "event=dataset_put module=dataset status=duplicate table={} key_len={}",
                        self.name,
                        key.len()
                    );
                    return Err(DatasetError::DuplicateKey(key.to_vec()));
                }
                return Err(err.into());
            }
        };

        debug!(
            "event=dataset_put module=dataset status=ok table={} key_len={} value_len={} duration_ms={}",
            self.name,
            key.len(),
            blob.len(),
            started_at.elapsed().as_millis()
        );
        Ok(Record {
            sequence_id,
            key: key.to_vec(),
            value: Some(value),
            created_at,
            updated_at: None,
        })
    }

    /// Returns the first row under `key`, by insertion order.
    pub fn get<V: DeserializeOwned>(&self, key: &[u8]) -> DatasetResult<Option<Record<V>>> {
        let mut stmt = self.conn.prepare_cached(&self.sql.select_first)?;
        let mut rows = stmt.query([key])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_record_row(row)?)),
            None => Ok(None),
        }
    }

    /// Returns every row under `key` in `sequence_id` order.
    pub fn get_all<V: DeserializeOwned>(&self, key: &[u8]) -> DatasetResult<Vec<Record<V>>> {
        let mut stmt = self.conn.prepare_cached(&self.sql.select_all)?;
        let mut rows = stmt.query([key])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    /// Returns the number of rows under `key`.
    pub fn count(&self, key: &[u8]) -> DatasetResult<usize> {
        let mut stmt = self.conn.prepare_cached(&self.sql.count_by_key)?;
        let count: i64 = stmt.query_row([key], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Deletes every row under `key` in one statement.
    pub fn delete(&self, key: &[u8]) -> DatasetResult<usize> {
        let mut stmt = self.conn.prepare_cached(&self.sql.delete_by_key)?;
        let deleted = stmt.execute([key])?;
        debug!(
            "event=dataset_delete module=dataset status=ok table={} key_len={} rows={}",
            self.name,
            key.len(),
            deleted
        );
        Ok(deleted)
    }

    /// Overwrites the value of every row under `key`.
    ///
    /// Last writer wins; no lock is taken beyond the statement itself.
    pub fn set<V: Serialize + ?Sized>(&self, key: &[u8], value: &V) -> DatasetResult<usize> {
        let blob = codec::encode(value)?;
        let mut stmt = self.conn.prepare_cached(&self.sql.update_by_key)?;
        let changed = stmt.execute(params![blob, key])?;
        if changed == 0 {
            return Err(DatasetError::NotFound(key.to_vec()));
        }

        debug!(
            "event=dataset_set module=dataset status=ok mode=value table={} key_len={} rows={}",
            self.name,
            key.len(),
            changed
        );
        Ok(changed)
    }

    /// Atomically rewrites every row under `key` with `transform(current)`.
    ///
    /// Rows are read and written inside one write-locked transaction, so two
    /// concurrent calls on the same key serialize and neither update is lost.
    /// A row whose value column is NULL fails with [`CodecError::Empty`].
    ///
    /// # Errors
    /// - [`DatasetError::NotFound`] when no row matched; nothing is written.
    /// - Backend lock timeouts surface unchanged as [`DatasetError::Db`].
    pub fn set_with<V, F>(&self, key: &[u8], mut transform: F) -> DatasetResult<usize>
    where
        V: Serialize + DeserializeOwned,
        F: FnMut(V) -> V,
    {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let lock_wait_ms = started_at.elapsed().as_millis();

        let locked = select_locked_rows(&tx, &self.sql.select_for_update, key)?;
        let mut changed = 0;
        for (sequence_id, stored) in locked {
            let current: V = codec::decode(stored.as_deref().unwrap_or_default())?;
            let next = transform(current);
            let blob = codec::encode(&next)?;
            changed += tx.execute(&self.sql.update_by_sequence, params![blob, sequence_id])?;
        }

        if changed == 0 {
            tx.rollback()?;
            return Err(DatasetError::NotFound(key.to_vec()));
        }
        tx.commit()?;

        debug!(
            "event=dataset_set module=dataset status=ok mode=transform table={} key_len={} rows={} lock_wait_ms={} duration_ms={}",
            self.name,
            key.len(),
            changed,
            lock_wait_ms,
            started_at.elapsed().as_millis()
        );
        Ok(changed)
    }
}

fn select_locked_rows(
    tx: &Transaction<'_>,
    sql: &str,
    key: &[u8],
) -> DatasetResult<Vec<(SequenceId, Option<Vec<u8>>)>> {
    let mut stmt = tx.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    let mut locked = Vec::new();
    while let Some(row) = rows.next()? {
        locked.push((row.get(0)?, row.get(1)?));
    }
    Ok(locked)
}

fn parse_record_row<V: DeserializeOwned>(row: &Row<'_>) -> DatasetResult<Record<V>> {
    let value = match row.get::<_, Option<Vec<u8>>>("value")? {
        Some(blob) => Some(codec::decode(&blob)?),
        None => None,
    };

    Ok(Record {
        sequence_id: row.get("sequence_id")?,
        key: row.get("key")?,
        value,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
