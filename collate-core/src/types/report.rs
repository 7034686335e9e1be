//! Run reporting: scan counters and the per-run report handed back to
//! operators and persisted with the run row.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FailureKind;
use crate::types::cluster::ClusterStats;
use crate::types::identifiers::RunId;

/// One persisted ingest failure, as reported back to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub path: String,
    pub kind: FailureKind,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

/// Counters describing the walk-and-hash phase of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files the walker accepted into the batch.
    pub files_seen: usize,
    /// Files rejected by include globs or the size cap.
    pub files_skipped: usize,
    /// Files whose fingerprint came from the staleness cache.
    pub cache_hits: usize,
    /// Files actually hashed this run.
    pub files_hashed: usize,
    /// Hash computations retried once before succeeding or failing.
    pub retries: usize,
    /// Files that failed fingerprinting and were skipped.
    pub failures: usize,
    /// Total bytes across accepted files.
    pub total_bytes: u64,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

/// Aggregate statistics for one completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub scan: ScanStats,
    pub clusters: ClusterStats,
    /// Canonical documents written, one per cluster.
    pub documents_written: usize,
    pub entities_minted: usize,
    pub aliases_learned: usize,
    pub edges_written: usize,
    /// Consolidated edges whose endpoints collapsed together.
    pub self_loops: usize,
}

/// The report for one batch run: what happened, what was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: RunStats,
    /// Every file skipped this run, with its error kind.
    pub failures: Vec<FailureRecord>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
