//! Content fingerprints: exact digest plus fuzzy MinHash signature.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MINHASH_LANES;

/// Exact content digest (lowercase blake3 hex). Byte-identical files
/// always share this value; any content difference changes it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExactHash(String);

impl ExactHash {
    /// Wrap a lowercase hex digest string.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExactHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fuzzy MinHash signature over sliding content shingles.
///
/// Two signatures estimate the Jaccard similarity of the underlying
/// shingle sets by the fraction of lanes that agree. Lane count and
/// the per-lane mixing coefficients are fixed per id-scheme version,
/// so signatures computed in different runs remain comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzySignature {
    lanes: Vec<u64>,
}

impl FuzzySignature {
    /// Wrap a full lane vector. Callers must supply exactly
    /// `MINHASH_LANES` lanes; the hasher is the only producer.
    pub fn from_lanes(lanes: Vec<u64>) -> Self {
        debug_assert_eq!(lanes.len(), MINHASH_LANES);
        Self { lanes }
    }

    pub fn lanes(&self) -> &[u64] {
        &self.lanes
    }

    /// Estimated Jaccard similarity: fraction of matching lanes.
    pub fn jaccard_estimate(&self, other: &Self) -> f64 {
        let matching = self
            .lanes
            .iter()
            .zip(&other.lanes)
            .filter(|(a, b)| a == b)
            .count();
        matching as f64 / self.lanes.len() as f64
    }

    /// Serialize lanes as little-endian bytes for blob storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.lanes.len() * 8);
        for lane in &self.lanes {
            out.extend_from_slice(&lane.to_le_bytes());
        }
        out
    }

    /// Rebuild a signature from a stored blob. Returns `None` when the
    /// blob length does not match the current lane count.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != MINHASH_LANES * 8 {
            return None;
        }
        let lanes = bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                u64::from_le_bytes(buf)
            })
            .collect();
        Some(Self { lanes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(fill: u64) -> FuzzySignature {
        FuzzySignature::from_lanes(vec![fill; MINHASH_LANES])
    }

    #[test]
    fn identical_signatures_estimate_one() {
        let a = sig(7);
        assert_eq!(a.jaccard_estimate(&a), 1.0);
    }

    #[test]
    fn disjoint_signatures_estimate_zero() {
        assert_eq!(sig(1).jaccard_estimate(&sig(2)), 0.0);
    }

    #[test]
    fn half_matching_lanes_estimate_half() {
        let mut lanes = vec![1u64; MINHASH_LANES];
        for lane in lanes.iter_mut().take(MINHASH_LANES / 2) {
            *lane = 9;
        }
        let a = FuzzySignature::from_lanes(lanes);
        let b = sig(1);
        assert!((a.jaccard_estimate(&b) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn byte_roundtrip_preserves_lanes() {
        let a = FuzzySignature::from_lanes((0..MINHASH_LANES as u64).collect());
        let restored = FuzzySignature::from_bytes(&a.to_bytes()).unwrap();
        assert_eq!(a, restored);
    }

    #[test]
    fn wrong_length_blob_is_rejected() {
        assert!(FuzzySignature::from_bytes(&[0u8; 17]).is_none());
    }
}
