//! Duplicate clustering over a fingerprint batch.
//!
//! Two phases. First, fingerprints with identical exact hashes
//! collapse into one group; byte-identical files can never land in
//! different clusters, whatever the fuzzy phase estimates. Second,
//! group representatives go through LSH banding, candidate pairs are
//! verified against the similarity threshold, and verified pairs merge
//! through a union-find. The output is a partition: every fingerprint
//! in exactly one cluster, clusters ordered by first batch index, each
//! tagged with how it formed and its weakest accepted estimate.

pub mod lsh;

use petgraph::unionfind::UnionFind;
use rustc_hash::FxHashMap;
use tracing::debug;

use collate_core::types::{
    ClusterMethod, ClusterResult, ClusterStats, DuplicateCluster, Fingerprint,
};

use lsh::BandIndex;

pub struct DuplicateClusterer {
    threshold: f64,
}

impl DuplicateClusterer {
    /// Clusterer with the given estimated-Jaccard merge threshold.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Partition a batch into duplicate clusters.
    pub fn cluster(&self, batch: &[Fingerprint]) -> ClusterResult {
        if batch.is_empty() {
            return ClusterResult {
                clusters: Vec::new(),
                stats: ClusterStats::default(),
            };
        }

        // Phase 1: exact groups, keyed by exact hash, in first-seen
        // batch order.
        let mut group_of_hash: FxHashMap<&str, usize> = FxHashMap::default();
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (idx, fp) in batch.iter().enumerate() {
            let group = *group_of_hash
                .entry(fp.exact_hash.as_str())
                .or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
            groups[group].push(idx);
        }
        let exact_groups = groups.iter().filter(|g| g.len() > 1).count();

        // Phase 2: fuzzy merge between group representatives. Members
        // of a group share content, so any member's signature stands
        // for the group; the first is taken.
        let mut index = BandIndex::new();
        for (group, members) in groups.iter().enumerate() {
            index.insert(group, &batch[members[0]].fuzzy);
        }

        let mut union: UnionFind<usize> = UnionFind::new(groups.len());
        let mut fuzzy_merges = 0usize;
        let mut accepted: Vec<(usize, f64)> = Vec::new();
        for (a, b) in index.candidate_pairs() {
            let estimate = batch[groups[a][0]]
                .fuzzy
                .jaccard_estimate(&batch[groups[b][0]].fuzzy);
            if estimate >= self.threshold {
                accepted.push((a, estimate));
                if union.union(a, b) {
                    fuzzy_merges += 1;
                }
            }
        }

        // Weakest accepted estimate per union root. Any fuzzy-merged
        // cluster reports the similarity of the link that would break
        // first if the threshold rose.
        let mut weakest: FxHashMap<usize, f64> = FxHashMap::default();
        for (group, estimate) in accepted {
            let root = union.find_mut(group);
            let entry = weakest.entry(root).or_insert(estimate);
            if estimate < *entry {
                *entry = estimate;
            }
        }

        // Collect the partition, clusters ordered by their smallest
        // batch index, members ascending.
        let mut cluster_of_root: FxHashMap<usize, usize> = FxHashMap::default();
        let mut clusters: Vec<DuplicateCluster> = Vec::new();
        for (group, members) in groups.iter().enumerate() {
            let root = union.find_mut(group);
            let similarity = weakest.get(&root).copied();
            let cluster = *cluster_of_root.entry(root).or_insert_with(|| {
                clusters.push(DuplicateCluster {
                    members: Vec::new(),
                    method: match similarity {
                        Some(_) => ClusterMethod::Fuzzy,
                        None => ClusterMethod::Exact,
                    },
                    similarity,
                });
                clusters.len() - 1
            });
            clusters[cluster].members.extend_from_slice(members);
        }
        for cluster in &mut clusters {
            cluster.members.sort_unstable();
        }
        clusters.sort_by_key(|c| c.members[0]);

        let singletons = clusters.iter().filter(|c| c.members.len() == 1).count();
        let stats = ClusterStats {
            documents: batch.len(),
            exact_groups,
            fuzzy_merges,
            singletons,
        };
        debug!(
            documents = stats.documents,
            clusters = clusters.len(),
            exact_groups,
            fuzzy_merges,
            "clustering complete"
        );

        ClusterResult { clusters, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collate_core::constants::{DEFAULT_SIMILARITY_THRESHOLD, MINHASH_LANES};
    use collate_core::types::{ExactHash, FuzzySignature, ScannedDocument};
    use std::path::PathBuf;

    fn make_fingerprint(hash: &str, lanes: Vec<u64>, path: &str) -> Fingerprint {
        Fingerprint {
            document: ScannedDocument {
                path: PathBuf::from(path),
                collection: "court-records".to_string(),
                size_bytes: 64,
                modified_at: None,
            },
            exact_hash: ExactHash::new(hash),
            fuzzy: FuzzySignature::from_lanes(lanes),
        }
    }

    fn uniform(fill: u64) -> Vec<u64> {
        vec![fill; MINHASH_LANES]
    }

    /// Lanes that agree with `uniform(base)` in the given fraction.
    fn similar_to(base: u64, fraction: f64) -> Vec<u64> {
        let agree = (MINHASH_LANES as f64 * fraction) as usize;
        let mut lanes = uniform(base);
        for lane in lanes.iter_mut().skip(agree) {
            *lane = base ^ 0xDEAD_BEEF;
        }
        lanes
    }

    fn clusterer() -> DuplicateClusterer {
        DuplicateClusterer::new(DEFAULT_SIMILARITY_THRESHOLD)
    }

    #[test]
    fn empty_batch_yields_empty_partition() {
        let result = clusterer().cluster(&[]);
        assert!(result.clusters.is_empty());
        assert_eq!(result.stats.documents, 0);
    }

    #[test]
    fn identical_hashes_collapse_to_one_cluster() {
        let batch = vec![
            make_fingerprint("aaaa", uniform(1), "a.pdf"),
            make_fingerprint("aaaa", uniform(1), "b.pdf"),
            make_fingerprint("bbbb", uniform(900), "c.pdf"),
        ];
        let result = clusterer().cluster(&batch);
        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.clusters[0].members, vec![0, 1]);
        assert_eq!(result.clusters[0].method, ClusterMethod::Exact);
        assert_eq!(result.clusters[0].similarity, None);
        assert_eq!(result.clusters[1].members, vec![2]);
        assert_eq!(result.stats.exact_groups, 1);
    }

    #[test]
    fn near_duplicates_merge_above_threshold() {
        let batch = vec![
            make_fingerprint("aaaa", uniform(1), "a.pdf"),
            make_fingerprint("bbbb", similar_to(1, 0.95), "b.pdf"),
        ];
        let result = clusterer().cluster(&batch);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].members, vec![0, 1]);
        assert_eq!(result.clusters[0].method, ClusterMethod::Fuzzy);
        assert!(result.clusters[0].similarity.unwrap() >= DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(result.stats.fuzzy_merges, 1);
    }

    #[test]
    fn dissimilar_documents_stay_apart() {
        let batch = vec![
            make_fingerprint("aaaa", uniform(1), "a.pdf"),
            make_fingerprint("bbbb", uniform(2), "b.pdf"),
        ];
        let result = clusterer().cluster(&batch);
        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.stats.fuzzy_merges, 0);
    }

    #[test]
    fn transitive_merges_form_one_cluster() {
        // a ~ b and b ~ c pass the threshold; a ~ c alone does not.
        // Union-find must still place all three together.
        let mut a = uniform(1);
        for lane in a.iter_mut().skip(96) {
            *lane = 9;
        }
        let b = uniform(1);
        let mut c = uniform(1);
        for lane in c.iter_mut().take(32) {
            *lane = 5;
        }
        let batch = vec![
            make_fingerprint("aaaa", a, "a.pdf"),
            make_fingerprint("bbbb", b, "b.pdf"),
            make_fingerprint("cccc", c, "c.pdf"),
        ];
        let result = DuplicateClusterer::new(0.70).cluster(&batch);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].members, vec![0, 1, 2]);
        assert_eq!(result.clusters[0].method, ClusterMethod::Fuzzy);
        // The reported similarity is the weakest accepted link.
        let weakest = result.clusters[0].similarity.unwrap();
        assert!((0.70..0.80).contains(&weakest), "weakest link {weakest}");
    }

    #[test]
    fn partition_covers_every_document_exactly_once() {
        let batch = vec![
            make_fingerprint("aaaa", uniform(1), "a.pdf"),
            make_fingerprint("aaaa", uniform(1), "b.pdf"),
            make_fingerprint("bbbb", similar_to(1, 0.9), "c.pdf"),
            make_fingerprint("cccc", uniform(50), "d.pdf"),
            make_fingerprint("dddd", uniform(60), "e.pdf"),
        ];
        let result = clusterer().cluster(&batch);
        let mut seen: Vec<usize> = result
            .clusters
            .iter()
            .flat_map(|c| c.members.iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn clustering_is_deterministic() {
        let batch = vec![
            make_fingerprint("aaaa", uniform(1), "a.pdf"),
            make_fingerprint("bbbb", similar_to(1, 0.85), "b.pdf"),
            make_fingerprint("cccc", similar_to(1, 0.82), "c.pdf"),
            make_fingerprint("dddd", uniform(9), "d.pdf"),
        ];
        let first = clusterer().cluster(&batch);
        let second = clusterer().cluster(&batch);
        assert_eq!(first.clusters, second.clusters);
    }

    #[test]
    fn exact_hash_wins_over_fuzzy_disagreement() {
        // Byte-identical files whose signatures would never bucket
        // together still share a cluster.
        let batch = vec![
            make_fingerprint("aaaa", uniform(1), "a.pdf"),
            make_fingerprint("aaaa", uniform(777), "b.pdf"),
        ];
        let result = clusterer().cluster(&batch);
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].members, vec![0, 1]);
        assert_eq!(result.clusters[0].method, ClusterMethod::Exact);
        assert_eq!(result.clusters[0].similarity, None);
    }
}
