//! Property tests for the content hasher.

use proptest::prelude::*;

use collate_ingest::hasher::minhash;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Same bytes, same signature, whatever the content.
    #[test]
    fn signature_is_a_pure_function(content in proptest::collection::vec(any::<u8>(), 1..4096)) {
        let a = minhash::signature(&content);
        let b = minhash::signature(&content);
        prop_assert_eq!(a, b);
    }

    /// A signature always estimates 1.0 against itself.
    #[test]
    fn self_similarity_is_one(content in proptest::collection::vec(any::<u8>(), 1..2048)) {
        let sig = minhash::signature(&content);
        prop_assert_eq!(sig.jaccard_estimate(&sig), 1.0);
    }

    /// Estimates are symmetric and bounded.
    #[test]
    fn estimates_are_symmetric_and_bounded(
        a in proptest::collection::vec(any::<u8>(), 1..2048),
        b in proptest::collection::vec(any::<u8>(), 1..2048),
    ) {
        let sa = minhash::signature(&a);
        let sb = minhash::signature(&b);
        let ab = sa.jaccard_estimate(&sb);
        let ba = sb.jaccard_estimate(&sa);
        prop_assert_eq!(ab, ba);
        prop_assert!((0.0..=1.0).contains(&ab));
    }
}
