//! Canonical selection: pick each cluster's surviving record.
//!
//! The representative is the member that wins, in order: best source
//! collection per the configured priority list, then shortest path,
//! then lexicographically smallest exact hash, then smallest path.
//! The policy is fixed per id-scheme version; the canonical id falls
//! out of the representative's exact hash, so the same corpus always
//! reproduces the same ids.

use rustc_hash::FxHashSet;
use tracing::trace;

use collate_core::errors::ResolveError;
use collate_core::types::{
    CanonicalDocument, ClusterResult, DocumentRef, DuplicateCluster, Fingerprint, ResolvedCluster,
};

/// Collection ranking for canonical selection.
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    priority: Vec<String>,
}

impl SelectionPolicy {
    /// Policy from an ordered collection list, best first.
    pub fn new(priority: Vec<String>) -> Self {
        Self { priority }
    }

    /// Rank of a collection: its list index, or one past the end for
    /// collections not listed.
    fn rank(&self, collection: &str) -> usize {
        self.priority
            .iter()
            .position(|c| c == collection)
            .unwrap_or(self.priority.len())
    }
}

pub struct CanonicalSelector {
    policy: SelectionPolicy,
}

impl CanonicalSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    /// Select the canonical record for one cluster.
    pub fn select(
        &self,
        batch: &[Fingerprint],
        cluster: &DuplicateCluster,
    ) -> Result<ResolvedCluster, ResolveError> {
        let representative = *cluster
            .members
            .iter()
            .min_by_key(|&&idx| {
                let fp = &batch[idx];
                let path = fp.path_str();
                (
                    self.policy.rank(&fp.document.collection),
                    path.len(),
                    fp.exact_hash.clone(),
                    path,
                )
            })
            .ok_or(ResolveError::EmptyCluster)?;

        let rep = &batch[representative];
        let canonical = CanonicalDocument::new(
            rep.exact_hash.clone(),
            rep.document.collection.clone(),
            rep.path_str(),
            cluster.members.len() as u32,
        );
        trace!(id = %canonical.id, members = cluster.members.len(), "selected canonical");

        // Every member hash and path becomes a lookup ref. Hashes
        // repeat across byte-identical members; paths never do.
        let mut refs = Vec::new();
        let mut seen_hashes = FxHashSet::default();
        for &idx in &cluster.members {
            let fp = &batch[idx];
            if seen_hashes.insert(fp.exact_hash.as_str()) {
                refs.push(DocumentRef::hash(fp.exact_hash.as_str()));
            }
            refs.push(DocumentRef::path(fp.path_str()));
        }
        refs.sort_by(|a, b| (a.kind.as_str(), &a.value).cmp(&(b.kind.as_str(), &b.value)));

        let mut members = Vec::with_capacity(cluster.members.len());
        members.push(representative);
        members.extend(cluster.members.iter().copied().filter(|&m| m != representative));

        Ok(ResolvedCluster { canonical, refs, members })
    }

    /// Select canonical records for a whole partition, in cluster
    /// order.
    pub fn select_all(
        &self,
        batch: &[Fingerprint],
        result: &ClusterResult,
    ) -> Result<Vec<ResolvedCluster>, ResolveError> {
        result
            .clusters
            .iter()
            .map(|cluster| self.select(batch, cluster))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collate_core::constants::DEFAULT_COLLECTION_PRIORITY;
    use collate_core::types::{
        ClusterMethod, DocId, ExactHash, FuzzySignature, RefKind, ScannedDocument,
    };
    use collate_core::constants::MINHASH_LANES;
    use std::path::PathBuf;

    fn fp(hash: &str, collection: &str, path: &str) -> Fingerprint {
        Fingerprint {
            document: ScannedDocument {
                path: PathBuf::from(path),
                collection: collection.to_string(),
                size_bytes: 10,
                modified_at: None,
            },
            exact_hash: ExactHash::new(hash),
            fuzzy: FuzzySignature::from_lanes(vec![1; MINHASH_LANES]),
        }
    }

    fn selector() -> CanonicalSelector {
        CanonicalSelector::new(SelectionPolicy::new(
            DEFAULT_COLLECTION_PRIORITY.iter().map(|s| s.to_string()).collect(),
        ))
    }

    fn cluster_of(members: Vec<usize>) -> DuplicateCluster {
        DuplicateCluster {
            members,
            method: ClusterMethod::Exact,
            similarity: None,
        }
    }

    #[test]
    fn priority_collection_wins() {
        let batch = vec![
            fp("bbbb", "press-scan", "short"),
            fp("aaaa", "court-records", "very/long/path/to/scan.pdf"),
        ];
        let resolved = selector().select(&batch, &cluster_of(vec![0, 1])).unwrap();
        assert_eq!(resolved.canonical.collection, "court-records");
        assert_eq!(resolved.canonical.exact_hash.as_str(), "aaaa");
        assert_eq!(resolved.members, vec![1, 0]);
    }

    #[test]
    fn shorter_path_breaks_collection_tie() {
        let batch = vec![
            fp("bbbb", "court-records", "deep/nested/scan.pdf"),
            fp("aaaa", "court-records", "scan.pdf"),
        ];
        let resolved = selector().select(&batch, &cluster_of(vec![0, 1])).unwrap();
        assert_eq!(resolved.canonical.representative_path, "scan.pdf");
    }

    #[test]
    fn smaller_hash_breaks_path_tie() {
        let batch = vec![
            fp("bbbb", "court-records", "scan1.pdf"),
            fp("aaaa", "court-records", "scan2.pdf"),
        ];
        let resolved = selector().select(&batch, &cluster_of(vec![0, 1])).unwrap();
        assert_eq!(resolved.canonical.exact_hash.as_str(), "aaaa");
    }

    #[test]
    fn unlisted_collection_ranks_below_listed() {
        let batch = vec![
            fp("aaaa", "mystery-box", "a.pdf"),
            fp("bbbb", "press-scan", "b.pdf"),
        ];
        let resolved = selector().select(&batch, &cluster_of(vec![0, 1])).unwrap();
        assert_eq!(resolved.canonical.collection, "press-scan");
    }

    #[test]
    fn canonical_id_comes_from_representative_hash() {
        let batch = vec![
            fp("aaaa", "court-records", "a.pdf"),
            fp("bbbb", "press-scan", "b.pdf"),
        ];
        let resolved = selector().select(&batch, &cluster_of(vec![0, 1])).unwrap();
        assert_eq!(resolved.canonical.id, DocId::derive("aaaa"));
    }

    #[test]
    fn refs_cover_every_member() {
        let batch = vec![
            fp("aaaa", "court-records", "a.pdf"),
            fp("aaaa", "press-scan", "b.pdf"),
            fp("cccc", "press-scan", "c.pdf"),
        ];
        let resolved = selector().select(&batch, &cluster_of(vec![0, 1, 2])).unwrap();
        let hashes: Vec<_> = resolved
            .refs
            .iter()
            .filter(|r| r.kind == RefKind::Hash)
            .map(|r| r.value.as_str())
            .collect();
        let paths: Vec<_> = resolved
            .refs
            .iter()
            .filter(|r| r.kind == RefKind::Path)
            .map(|r| r.value.as_str())
            .collect();
        assert_eq!(hashes, vec!["aaaa", "cccc"]);
        assert_eq!(paths, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn empty_cluster_is_an_error() {
        let batch: Vec<Fingerprint> = Vec::new();
        let err = selector().select(&batch, &cluster_of(vec![])).unwrap_err();
        assert!(matches!(err, ResolveError::EmptyCluster));
    }

    #[test]
    fn member_count_matches_cluster_size() {
        let batch = vec![
            fp("aaaa", "court-records", "a.pdf"),
            fp("aaaa", "court-records", "b.pdf"),
            fp("aaaa", "court-records", "c.pdf"),
        ];
        let resolved = selector().select(&batch, &cluster_of(vec![0, 1, 2])).unwrap();
        assert_eq!(resolved.canonical.member_count, 3);
    }
}
