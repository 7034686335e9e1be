//! # collate-resolve
//!
//! Identity resolution over fingerprinted batches: duplicate
//! clustering (exact hash grouping plus LSH-bucketed fuzzy merging),
//! canonical record selection, entity mention normalization against an
//! alias snapshot, and relationship graph consolidation.

pub mod cluster;
pub mod entities;
pub mod graph;
pub mod select;

pub use cluster::DuplicateClusterer;
pub use entities::{AliasSnapshot, EntityRegistry, MentionNormalizer};
pub use graph::{GraphConsolidator, GraphExport, GraphNode};
pub use select::{CanonicalSelector, SelectionPolicy};
