//! Pipeline orchestration errors.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("a batch run is already in progress")]
    AlreadyRunning,

    #[error("corpus root {path} is not a readable directory")]
    InvalidCorpusRoot { path: PathBuf },

    #[error("record file {path} unreadable: {reason}")]
    RecordsUnreadable { path: PathBuf, reason: String },

    #[error("export to {path} failed: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}
