//! MinHash signatures over sliding byte shingles.
//!
//! Every `SHINGLE_WIDTH`-byte window is hashed with xxh3; each of the
//! 128 lanes keeps the minimum of a fixed affine mix of those hashes.
//! The lane coefficients are derived from fixed seeds, so signatures
//! computed in different runs and processes are directly comparable.

use std::sync::OnceLock;

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

use collate_core::constants::{MINHASH_LANES, SHINGLE_WIDTH};
use collate_core::types::FuzzySignature;

/// Modular sampling: a shingle participates when `hash & MASK == 0`
/// (1 in 64). Keeps lane mixing off the critical path for large scans
/// while staying a pure function of content.
const SAMPLE_MASK: u64 = 0x3F;

/// Below this many sampled shingles the estimate is too noisy;
/// fall back to the full shingle set.
const MIN_SAMPLED: usize = MINHASH_LANES;

const LANE_SEED_A: u64 = 0xc011_a7e5_0000_000a;
const LANE_SEED_B: u64 = 0xc011_a7e5_0000_000b;

fn lane_coefficients() -> &'static [(u64, u64); MINHASH_LANES] {
    static COEFFS: OnceLock<[(u64, u64); MINHASH_LANES]> = OnceLock::new();
    COEFFS.get_or_init(|| {
        let mut table = [(0u64, 0u64); MINHASH_LANES];
        for (i, entry) in table.iter_mut().enumerate() {
            let lane = (i as u64).to_le_bytes();
            // Odd multiplier keeps the mix a bijection on u64.
            let a = xxh3_64_with_seed(&lane, LANE_SEED_A) | 1;
            let b = xxh3_64_with_seed(&lane, LANE_SEED_B);
            *entry = (a, b);
        }
        table
    })
}

/// Compute the fuzzy signature of one document's content.
///
/// Content shorter than one shingle is hashed as a single shingle;
/// callers reject empty content before hashing.
pub fn signature(content: &[u8]) -> FuzzySignature {
    let coeffs = lane_coefficients();
    let mut lanes = [u64::MAX; MINHASH_LANES];

    let sampled = fold_shingles(content, &mut lanes, coeffs, true);
    if sampled < MIN_SAMPLED {
        lanes = [u64::MAX; MINHASH_LANES];
        fold_shingles(content, &mut lanes, coeffs, false);
    }

    FuzzySignature::from_lanes(lanes.to_vec())
}

/// Fold shingle hashes into the lane minima. Returns the number of
/// shingles folded.
fn fold_shingles(
    content: &[u8],
    lanes: &mut [u64; MINHASH_LANES],
    coeffs: &[(u64, u64); MINHASH_LANES],
    sample: bool,
) -> usize {
    let mut folded = 0usize;
    let mut fold = |hash: u64| {
        if sample && hash & SAMPLE_MASK != 0 {
            return;
        }
        folded += 1;
        for (lane, &(a, b)) in lanes.iter_mut().zip(coeffs.iter()) {
            let mixed = a.wrapping_mul(hash).wrapping_add(b);
            if mixed < *lane {
                *lane = mixed;
            }
        }
    };

    if content.len() < SHINGLE_WIDTH {
        fold(xxh3_64(content));
    } else {
        for window in content.windows(SHINGLE_WIDTH) {
            fold(xxh3_64(window));
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        let content = b"the quick brown fox jumps over the lazy dog".repeat(40);
        assert_eq!(signature(&content), signature(&content));
    }

    #[test]
    fn short_content_gets_a_signature() {
        let sig = signature(b"abc");
        assert_eq!(sig.lanes().len(), MINHASH_LANES);
    }

    #[test]
    fn near_duplicates_estimate_high() {
        let base: Vec<u8> = (0..200_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let mut edited = base.clone();
        // Flip a small run in the middle: a re-scan artifact.
        for byte in edited.iter_mut().skip(100_000).take(200) {
            *byte ^= 0xFF;
        }
        let estimate = signature(&base).jaccard_estimate(&signature(&edited));
        assert!(estimate > 0.90, "estimate was {estimate}");
    }

    #[test]
    fn unrelated_content_estimates_low() {
        let a: Vec<u8> = (0..100_000u32).flat_map(|i| i.to_le_bytes()).collect();
        let b: Vec<u8> = (0..100_000u32)
            .flat_map(|i| (i.wrapping_mul(2_654_435_761)).to_le_bytes())
            .collect();
        let estimate = signature(&a).jaccard_estimate(&signature(&b));
        assert!(estimate < 0.20, "estimate was {estimate}");
    }

    #[test]
    fn repetitive_content_produces_stable_signature() {
        // All-identical windows may miss the sample mask entirely;
        // the fallback path must still produce a usable signature.
        let content = vec![0u8; 4096];
        let sig = signature(&content);
        assert_eq!(sig.jaccard_estimate(&signature(&content)), 1.0);
    }
}
