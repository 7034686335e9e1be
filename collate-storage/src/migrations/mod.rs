//! Versioned schema migrations, gated on PRAGMA user_version.

pub mod v001_corpus_tables;
pub mod v002_entity_tables;
pub mod v003_graph_tables;

use rusqlite::Connection;
use tracing::info;

use collate_core::errors::{CollateError, CollateResult, StorageError};

use crate::to_storage_err;

/// Latest schema version. Bump when adding a migration.
pub const SCHEMA_VERSION: i64 = 3;

/// Apply every migration newer than the database's user_version.
/// Safe to call on every open; already-applied versions are skipped.
pub fn run_migrations(conn: &Connection) -> CollateResult<()> {
    let mut version = user_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(CollateError::StorageError(StorageError::MigrationFailed {
            version: version as u32,
            reason: format!("database is newer than this binary (latest {SCHEMA_VERSION})"),
        }));
    }

    while version < SCHEMA_VERSION {
        let next = version + 1;
        apply(conn, next).map_err(|e| {
            CollateError::StorageError(StorageError::MigrationFailed {
                version: next as u32,
                reason: e.to_string(),
            })
        })?;
        set_user_version(conn, next)?;
        info!(version = next, "applied schema migration");
        version = next;
    }
    Ok(())
}

fn apply(conn: &Connection, version: i64) -> CollateResult<()> {
    match version {
        1 => v001_corpus_tables::migrate(conn),
        2 => v002_entity_tables::migrate(conn),
        3 => v003_graph_tables::migrate(conn),
        other => Err(to_storage_err(format!("unknown schema version {other}"))),
    }
}

fn user_version(conn: &Connection) -> CollateResult<i64> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}

fn set_user_version(conn: &Connection, version: i64) -> CollateResult<()> {
    conn.pragma_update(None, "user_version", version)
        .map_err(|e| to_storage_err(e.to_string()))
}
