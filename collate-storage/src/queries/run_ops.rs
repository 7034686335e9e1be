//! Run bookkeeping.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use collate_core::errors::{CollateError, CollateResult};
use collate_core::types::{RunId, RunStats};

use super::parse_timestamp;
use crate::to_storage_err;

/// Record a completed run with its aggregate stats.
pub fn record_run(
    conn: &Connection,
    run: &RunId,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: &RunStats,
) -> CollateResult<()> {
    let stats_json = serde_json::to_string(stats).map_err(CollateError::SerializationError)?;
    conn.execute(
        "INSERT OR REPLACE INTO runs (id, started_at, finished_at, stats)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            run.as_str(),
            started_at.to_rfc3339(),
            finished_at.to_rfc3339(),
            stats_json,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Stats recorded for one run, if it completed.
pub fn run_stats(conn: &Connection, run: &RunId) -> CollateResult<Option<RunStats>> {
    let stats_json: Option<String> = conn
        .query_row(
            "SELECT stats FROM runs WHERE id = ?1",
            params![run.as_str()],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .flatten();

    match stats_json {
        Some(json) => {
            let stats = serde_json::from_str(&json).map_err(CollateError::SerializationError)?;
            Ok(Some(stats))
        }
        None => Ok(None),
    }
}

/// Timestamps and stats for one completed run.
pub fn get_run(
    conn: &Connection,
    run: &RunId,
) -> CollateResult<Option<(DateTime<Utc>, Option<DateTime<Utc>>, Option<RunStats>)>> {
    let row = conn
        .query_row(
            "SELECT started_at, finished_at, stats FROM runs WHERE id = ?1",
            params![run.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((started, finished, stats_json)) = row else {
        return Ok(None);
    };
    let started = parse_timestamp(&started, "started_at")?;
    let finished = match finished {
        Some(raw) => Some(parse_timestamp(&raw, "finished_at")?),
        None => None,
    };
    let stats = match stats_json {
        Some(json) => {
            Some(serde_json::from_str(&json).map_err(CollateError::SerializationError)?)
        }
        None => None,
    };
    Ok(Some((started, finished, stats)))
}
