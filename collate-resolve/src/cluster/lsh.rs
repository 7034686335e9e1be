//! LSH banding over MinHash signatures.
//!
//! The 128 lanes split into 16 bands of 8 lanes; each band hashes to
//! one bucket key. Two documents become merge candidates when they
//! share at least one band key, which keeps fuzzy comparison linear in
//! candidates instead of quadratic in documents.

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use collate_core::constants::{LSH_BANDS, LSH_ROWS_PER_BAND};
use collate_core::types::collections::BandVec;
use collate_core::types::FuzzySignature;

/// One bucket key per band.
pub fn band_keys(signature: &FuzzySignature) -> BandVec<u64> {
    let lanes = signature.lanes();
    let mut keys = BandVec::new();
    for band in 0..LSH_BANDS {
        let start = band * LSH_ROWS_PER_BAND;
        let mut bytes = [0u8; LSH_ROWS_PER_BAND * 8];
        for (chunk, lane) in bytes
            .chunks_exact_mut(8)
            .zip(&lanes[start..start + LSH_ROWS_PER_BAND])
        {
            chunk.copy_from_slice(&lane.to_le_bytes());
        }
        // Seed by band so identical lane runs in different bands do
        // not collide into one bucket.
        keys.push(xxh3_64_with_seed(&bytes, band as u64));
    }
    keys
}

/// Bucket index from band key to the items that produced it.
#[derive(Debug, Default)]
pub struct BandIndex {
    buckets: FxHashMap<u64, Vec<usize>>,
}

impl BandIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: usize, signature: &FuzzySignature) {
        for key in band_keys(signature) {
            self.buckets.entry(key).or_default().push(item);
        }
    }

    /// All distinct candidate pairs, ascending. Sorted so that the
    /// merge order downstream is reproducible.
    pub fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = rustc_hash::FxHashSet::default();
        for bucket in self.buckets.values() {
            if bucket.len() < 2 {
                continue;
            }
            for (i, &a) in bucket.iter().enumerate() {
                for &b in &bucket[i + 1..] {
                    let pair = if a < b { (a, b) } else { (b, a) };
                    if pair.0 != pair.1 {
                        pairs.insert(pair);
                    }
                }
            }
        }
        let mut pairs: Vec<_> = pairs.into_iter().collect();
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collate_core::constants::MINHASH_LANES;

    fn sig(fill: u64) -> FuzzySignature {
        FuzzySignature::from_lanes(vec![fill; MINHASH_LANES])
    }

    #[test]
    fn identical_signatures_share_every_band() {
        let a = band_keys(&sig(3));
        let b = band_keys(&sig(3));
        assert_eq!(a, b);
        assert_eq!(a.len(), LSH_BANDS);
    }

    #[test]
    fn bands_are_seeded_distinctly() {
        // Uniform lanes mean every band hashes the same byte string;
        // the per-band seed must still separate the keys.
        let keys = band_keys(&sig(42));
        let distinct: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(distinct.len(), LSH_BANDS);
    }

    #[test]
    fn shared_band_produces_candidate_pair() {
        let mut index = BandIndex::new();
        index.insert(0, &sig(7));
        index.insert(1, &sig(7));
        index.insert(2, &sig(99));
        assert_eq!(index.candidate_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn partially_matching_signatures_still_bucket_together() {
        // First band identical, the rest different: one shared band
        // is enough to become candidates.
        let mut lanes_a = vec![5u64; MINHASH_LANES];
        let mut lanes_b = vec![6u64; MINHASH_LANES];
        for i in 0..LSH_ROWS_PER_BAND {
            lanes_a[i] = 1;
            lanes_b[i] = 1;
        }
        let mut index = BandIndex::new();
        index.insert(0, &FuzzySignature::from_lanes(lanes_a));
        index.insert(1, &FuzzySignature::from_lanes(lanes_b));
        assert_eq!(index.candidate_pairs(), vec![(0, 1)]);
    }
}
