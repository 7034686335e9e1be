//! The single write connection. Every mutation in the system goes
//! through this one connection, serialized by its mutex.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use collate_core::config::StorageConfig;
use collate_core::errors::CollateResult;

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// Owns the write connection behind a mutex.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open the write connection for the given database file.
    pub fn open(path: &Path, config: &StorageConfig) -> CollateResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory write connection (for testing).
    pub fn open_in_memory(config: &StorageConfig) -> CollateResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Execute a closure holding the writer lock. Concurrent callers
    /// serialize here instead of racing into SQLITE_BUSY.
    pub fn with_conn_sync<F, T>(&self, f: F) -> CollateResult<T>
    where
        F: FnOnce(&Connection) -> CollateResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("write connection lock poisoned: {e}")))?;
        f(&guard)
    }
}
