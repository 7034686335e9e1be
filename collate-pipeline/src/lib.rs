//! # collate-pipeline
//!
//! Batch orchestration over the other collate crates: walk the corpus,
//! fingerprint it, cluster and select canonical documents, resolve
//! mentions and edges, persist everything, and report the run. The
//! `collate` binary in this crate is the operator surface.

pub mod export;
pub mod records;
pub mod runner;

pub use export::{export_from_store, write_export};
pub use records::{load_edges, load_mentions, EdgeRecord, MentionRecord};
pub use runner::{BatchRunner, RunOutcome};
