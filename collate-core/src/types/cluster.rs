//! Duplicate cluster types produced by resolution.

use serde::{Deserialize, Serialize};

use crate::types::document::{CanonicalDocument, DocumentRef};

/// How a cluster's members came together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMethod {
    /// Every member shares one exact hash.
    Exact,
    /// At least one merge came from signature similarity.
    Fuzzy,
}

/// One duplicate cluster over a fingerprint batch. Members are indices
/// into the batch, sorted ascending; every fingerprint lands in exactly
/// one cluster (singletons included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCluster {
    pub members: Vec<usize>,
    pub method: ClusterMethod,
    /// Weakest pairwise estimate that held the cluster together.
    /// `None` when the cluster is a single exact group.
    pub similarity: Option<f64>,
}

impl DuplicateCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of duplicate clustering: a partition of the batch.
#[derive(Debug, Clone)]
pub struct ClusterResult {
    pub clusters: Vec<DuplicateCluster>,
    pub stats: ClusterStats,
}

/// Counters describing one clustering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    /// Fingerprints in the batch.
    pub documents: usize,
    /// Groups collapsed by identical exact hash.
    pub exact_groups: usize,
    /// Group pairs merged by fuzzy similarity.
    pub fuzzy_merges: usize,
    /// Clusters of size one.
    pub singletons: usize,
}

/// A cluster after canonical selection: the surviving record plus the
/// secondary identifiers of every member.
#[derive(Debug, Clone)]
pub struct ResolvedCluster {
    pub canonical: CanonicalDocument,
    pub refs: Vec<DocumentRef>,
    /// Batch indices of the members, representative first.
    pub members: Vec<usize>,
}
