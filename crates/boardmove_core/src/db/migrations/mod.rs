//! Versioned schema for the board store.
//!
//! Each step is one SQL file. The schema version lives in `PRAGMA user_version`
//! and all pending steps run inside a single transaction, so a failed upgrade
//! leaves the previous version in place.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "boards",
        sql: include_str!("0001_boards.sql"),
    },
    Migration {
        version: 2,
        name: "comments_votes",
        sql: include_str!("0002_comments_votes.sql"),
    },
];

/// Schema version this binary writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

fn pending(from_version: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |migration| migration.version > from_version)
}

/// Brings `conn` up to [`latest_version`]. Returns how many steps ran.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the database is newer than this binary.
/// - `Sqlite` when a step fails; nothing from this call is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let tx = conn.transaction()?;
    let mut applied = 0;
    for migration in pending(from_version) {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        debug!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
        applied += 1;
    }
    tx.commit()?;

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, pending, MIGRATIONS};
    use rusqlite::Connection;

    #[test]
    fn versions_increase_and_names_are_unique() {
        assert!(MIGRATIONS
            .windows(2)
            .all(|pair| pair[0].version < pair[1].version
                && pair[0].name != pair[1].name));
        assert_eq!(pending(0).count(), MIGRATIONS.len());
        assert_eq!(pending(latest_version()).count(), 0);
    }

    #[test]
    fn second_run_applies_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(apply_migrations(&mut conn).unwrap(), MIGRATIONS.len());
        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
    }
}
