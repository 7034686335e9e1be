//! Error taxonomy for the collate pipeline.
//!
//! Each subsystem has its own enum; `CollateError` is the umbrella
//! every public fallible operation returns. Per-document ingest
//! failures are collected into the run's failure report instead of
//! propagating, so one bad file never aborts a batch.

pub mod config_error;
pub mod ingest_error;
pub mod pipeline_error;
pub mod resolve_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use ingest_error::{FailureKind, IngestError};
pub use pipeline_error::PipelineError;
pub use resolve_error::ResolveError;
pub use storage_error::StorageError;

/// Umbrella error for the collate pipeline.
#[derive(Debug, thiserror::Error)]
pub enum CollateError {
    #[error(transparent)]
    IngestError(#[from] IngestError),

    #[error(transparent)]
    ResolveError(#[from] ResolveError),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    PipelineError(#[from] PipelineError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("document not found: {id}")]
    DocumentNotFound { id: String },

    #[error("entity not found: {id}")]
    EntityNotFound { id: String },
}

/// Result alias used across the workspace.
pub type CollateResult<T> = Result<T, CollateError>;
