//! Ingest errors: walking and fingerprinting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Failure category persisted with each failure report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Io,
    CorruptInput,
    HashComputation,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::CorruptInput => "corrupt_input",
            Self::HashComputation => "hash_computation",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "io" => Some(Self::Io),
            "corrupt_input" => Some(Self::CorruptInput),
            "hash_computation" => Some(Self::HashComputation),
            _ => None,
        }
    }
}

/// Errors that can occur while fingerprinting one document. A failure
/// here removes the document from the batch; it never aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt input {path}: {reason}")]
    CorruptInput { path: PathBuf, reason: String },

    #[error("hash computation failed for {path}: {detail}")]
    HashComputation { path: PathBuf, detail: String },
}

impl IngestError {
    /// Category recorded in the failure report.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io { .. } => FailureKind::Io,
            Self::CorruptInput { .. } => FailureKind::CorruptInput,
            Self::HashComputation { .. } => FailureKind::HashComputation,
        }
    }

    /// Whether the failure is worth one retry before being reported.
    /// Hash computation failures are presumed transient (contention,
    /// racing writers); IO and corruption failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::HashComputation { .. })
    }

    /// Path of the document the failure is attached to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. }
            | Self::CorruptInput { path, .. }
            | Self::HashComputation { path, .. } => path,
        }
    }
}
