//! Ingest failure reports, persisted per run.

use rusqlite::{params, Connection};

use collate_core::errors::{CollateResult, FailureKind, IngestError};
use collate_core::types::{FailureRecord, RunId};

use super::parse_timestamp;
use crate::{to_storage_err, to_txn_err};

/// Record every failure from a run in one transaction.
pub fn record_failures(
    conn: &Connection,
    run: &RunId,
    failures: &[IngestError],
) -> CollateResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_txn_err(format!("record_failures begin: {e}")))?;

    match record_failures_inner(&tx, run, failures) {
        Ok(written) => {
            tx.commit()
                .map_err(|e| to_txn_err(format!("record_failures commit: {e}")))?;
            Ok(written)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn record_failures_inner(
    conn: &Connection,
    run: &RunId,
    failures: &[IngestError],
) -> CollateResult<usize> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO ingest_failures (run_id, path, kind, detail)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    for failure in failures {
        stmt.execute(params![
            run.as_str(),
            failure.path().to_string_lossy(),
            failure.kind().as_str(),
            failure.to_string(),
        ])
        .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(failures.len())
}

/// Failures recorded for one run, in insertion order.
pub fn failures_for_run(conn: &Connection, run: &RunId) -> CollateResult<Vec<FailureRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT path, kind, detail, recorded_at FROM ingest_failures
             WHERE run_id = ?1 ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![run.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut failures = Vec::new();
    for row in rows {
        let (path, kind, detail, recorded_at) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let kind = FailureKind::parse(&kind)
            .ok_or_else(|| to_storage_err(format!("unknown failure kind {kind:?}")))?;
        failures.push(FailureRecord {
            path,
            kind,
            detail,
            recorded_at: parse_timestamp(&recorded_at, "recorded_at")?,
        });
    }
    Ok(failures)
}
