//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas and the busy timeout that bounds every store wait.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::CoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file with the default busy timeout.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", Connection::open_in_memory, DEFAULT_BUSY_TIMEOUT)
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// `busy_timeout` bounds how long any statement waits on another writer
/// before failing with `SQLITE_BUSY`.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let path = path.as_ref();
    bootstrap("file", || Connection::open(path), busy_timeout)
}

/// Opens the store described by `config`.
///
/// Uses an in-memory database when `db_path` is absent.
pub fn open_configured(config: &CoreConfig) -> DbResult<Connection> {
    let busy_timeout = config.busy_timeout();
    match config.db_path.as_deref() {
        Some(path) => open_db_with_timeout(path, busy_timeout),
        None => bootstrap("memory", Connection::open_in_memory, busy_timeout),
    }
}

fn bootstrap(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match configure_connection(&mut conn, busy_timeout) {
        Ok(migrations_applied) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={} busy_timeout_ms={} migrations_applied={}",
                started_at.elapsed().as_millis(),
                busy_timeout.as_millis(),
                migrations_applied
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Returns the number of migrations applied.
fn configure_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<usize> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)
}
