//! Data structures shared across the collate pipeline.
//! FxHashMap, SmallVec, content-derived ids, fingerprints, clusters,
//! entities, graph edges.

pub mod cluster;
pub mod collections;
pub mod document;
pub mod entity;
pub mod fingerprint;
pub mod graph;
pub mod identifiers;
pub mod report;

pub use cluster::{ClusterMethod, ClusterResult, ClusterStats, DuplicateCluster, ResolvedCluster};
pub use collections::{FxHashMap, FxHashSet};
pub use document::{CanonicalDocument, DocumentRef, Fingerprint, RefKind, ScannedDocument};
pub use entity::{
    AliasBinding, AliasSource, CanonicalEntity, Correction, EntityKind, EntityMention,
    Resolution, ResolutionMethod,
};
pub use fingerprint::{ExactHash, FuzzySignature};
pub use graph::{ConsolidatedEdge, EdgeFlags, RawEdge};
pub use identifiers::{DocId, EntityId, RunId};
pub use report::{FailureRecord, RunReport, RunStats, ScanStats};
