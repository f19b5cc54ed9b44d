//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply the pragmas datasets rely on for lock waiting and journaling.
//!
//! # Invariants
//! - Options are validated before any file is touched.
//! - Each caller thread should own its connection; datasets only borrow it.

use super::{DbResult, OpenOptions};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

/// Opens a SQLite database file with default [`OpenOptions`].
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with(path, &OpenOptions::default())
}

/// Opens a SQLite database file with explicit options.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with(path: impl AsRef<Path>, options: &OpenOptions) -> DbResult<Connection> {
    options.validate()?;
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match configure_connection(&conn, options, true) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode=file duration_ms={} busy_timeout_ms={} journal_mode={:?}",
                started_at.elapsed().as_millis(),
                options.busy_timeout_ms,
                options.journal_mode
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_configure_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens a private in-memory SQLite database.
///
/// Only the returned connection can see the data, so concurrency tests need
/// a file-backed database instead.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let conn = Connection::open_in_memory().inspect_err(|err| {
        error!(
            "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
    })?;
    configure_connection(&conn, &OpenOptions::default(), false)?;

    info!(
        "event=db_open module=db status=ok mode=memory duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

fn configure_connection(conn: &Connection, options: &OpenOptions, file_backed: bool) -> DbResult<()> {
    conn.busy_timeout(options.busy_timeout())?;
    if file_backed {
        // journal_mode answers with the mode actually in effect.
        let _mode: String = conn.query_row(
            &format!("PRAGMA journal_mode = {};", options.journal_mode.pragma_value()),
            [],
            |row| row.get(0),
        )?;
    }
    Ok(())
}
