//! Query modules. Free functions over a borrowed connection so they
//! compose inside either a pooled read or the writer's transaction.

pub mod document_ops;
pub mod entity_ops;
pub mod failure_ops;
pub mod graph_ops;
pub mod metadata_ops;
pub mod run_ops;

use chrono::{DateTime, Utc};

use collate_core::errors::CollateResult;

use crate::to_storage_err;

/// Parse an RFC3339 timestamp column.
pub(crate) fn parse_timestamp(raw: &str, column: &str) -> CollateResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| to_storage_err(format!("parse {column}: {e}")))
}
