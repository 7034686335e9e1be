//! Criterion benchmarks for duplicate clustering at corpus scale.

use criterion::{criterion_group, criterion_main, Criterion};

use collate_core::constants::{DEFAULT_SIMILARITY_THRESHOLD, MINHASH_LANES};
use collate_core::types::{ExactHash, Fingerprint, FuzzySignature, ScannedDocument};
use collate_resolve::DuplicateClusterer;

fn signature_lanes(seed: usize, perturbed: usize) -> Vec<u64> {
    (0..MINHASH_LANES)
        .map(|lane| {
            let base = (seed * 31 + lane) as u64;
            if lane < perturbed {
                base ^ 0xdead_beef
            } else {
                base
            }
        })
        .collect()
}

/// A corpus-shaped batch: roughly 10% byte-identical copies, 10% near
/// duplicates above the merge threshold, the rest unique.
fn make_batch(n: usize) -> Vec<Fingerprint> {
    let mut batch = Vec::with_capacity(n);
    for i in 0..n {
        let (hash, lanes) = match i % 10 {
            1 => (format!("{:08x}", i - 1), signature_lanes(i - 1, 0)),
            2 => (format!("{i:08x}"), signature_lanes(i - 2, 12)),
            _ => (format!("{i:08x}"), signature_lanes(i, 0)),
        };
        batch.push(Fingerprint {
            document: ScannedDocument {
                path: format!("corpus/doc-{i:06}.pdf").into(),
                collection: "court-records".to_string(),
                size_bytes: 2048,
                modified_at: None,
            },
            exact_hash: ExactHash::new(hash),
            fuzzy: FuzzySignature::from_lanes(lanes),
        });
    }
    batch
}

fn bench_cluster(c: &mut Criterion) {
    let clusterer = DuplicateClusterer::new(DEFAULT_SIMILARITY_THRESHOLD);
    for n in [1_000usize, 10_000] {
        let batch = make_batch(n);
        c.bench_function(&format!("cluster_{n}_fingerprints"), |b| {
            b.iter(|| clusterer.cluster(&batch))
        });
    }
}

criterion_group!(benches, bench_cluster);
criterion_main!(benches);
