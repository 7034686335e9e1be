//! # collate-ingest
//!
//! Corpus discovery and content hashing. The walker turns configured
//! collection roots into a deterministic batch of scanned documents;
//! the hasher turns each document into a fingerprint carrying an exact
//! blake3 digest and a fuzzy MinHash signature.

pub mod hasher;
pub mod walker;

pub use hasher::{fingerprint, fingerprint_batch, BatchOutcome};
pub use walker::{CorpusWalker, WalkOutcome, WalkStats};
