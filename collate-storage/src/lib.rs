//! SQLite persistence for collate.
//!
//! One write connection serializes all mutations; a small pool of
//! read-only connections serves lookups concurrently under WAL. The
//! schema is applied by versioned migrations gated on
//! `PRAGMA user_version`.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StoreEngine;

use collate_core::errors::{CollateError, StorageError};

/// Wrap a low-level SQLite failure into the crate error type.
pub(crate) fn to_storage_err(message: impl Into<String>) -> CollateError {
    CollateError::StorageError(StorageError::SqliteError { message: message.into() })
}

/// Wrap a transaction begin/commit failure.
pub(crate) fn to_txn_err(reason: impl Into<String>) -> CollateError {
    CollateError::StorageError(StorageError::TransactionFailed { reason: reason.into() })
}
