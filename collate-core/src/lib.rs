//! # collate-core
//!
//! Foundation crate for the collate identity-resolution pipeline.
//! Defines all shared types, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::CollateConfig;
pub use errors::{CollateError, CollateResult};
pub use types::{
    CanonicalDocument, CanonicalEntity, DocId, DuplicateCluster, EntityId, EntityKind,
    ExactHash, Fingerprint, FuzzySignature,
};
