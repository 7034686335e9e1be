//! Criterion benchmarks for the store engine: batch cluster writes and
//! identifier lookups.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use collate_core::config::StorageConfig;
use collate_core::constants::MINHASH_LANES;
use collate_core::types::{
    CanonicalDocument, DocumentRef, ExactHash, Fingerprint, FuzzySignature, ResolvedCluster,
    ScannedDocument,
};
use collate_storage::StoreEngine;

fn make_batch(n: usize) -> (Vec<Fingerprint>, Vec<ResolvedCluster>) {
    let mut batch = Vec::with_capacity(n);
    let mut clusters = Vec::with_capacity(n);
    for i in 0..n {
        let hash = format!("{i:08x}");
        let path = format!("corpus/doc-{i:06}.pdf");
        batch.push(Fingerprint {
            document: ScannedDocument {
                path: path.clone().into(),
                collection: "court-records".to_string(),
                size_bytes: 2048,
                modified_at: None,
            },
            exact_hash: ExactHash::new(hash.clone()),
            fuzzy: FuzzySignature::from_lanes(vec![i as u64; MINHASH_LANES]),
        });
        clusters.push(ResolvedCluster {
            canonical: CanonicalDocument::new(
                ExactHash::new(hash.clone()),
                "court-records",
                &path,
                1,
            ),
            refs: vec![DocumentRef::hash(hash), DocumentRef::path(path)],
            members: vec![i],
        });
    }
    (batch, clusters)
}

fn bench_persist_clusters(c: &mut Criterion) {
    let (batch, clusters) = make_batch(500);

    c.bench_function("persist_500_clusters", |b| {
        b.iter_batched(
            || {
                let dir = tempfile::tempdir().unwrap();
                let engine =
                    StoreEngine::open(&dir.path().join("bench.db"), &StorageConfig::default())
                        .unwrap();
                (dir, engine)
            },
            |(_dir, engine)| {
                engine.persist_clusters(&clusters, &batch).unwrap();
            },
            BatchSize::PerIteration,
        )
    });
}

fn bench_lookup_by_path(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let engine =
        StoreEngine::open(&dir.path().join("bench.db"), &StorageConfig::default()).unwrap();
    let (batch, clusters) = make_batch(1000);
    engine.persist_clusters(&clusters, &batch).unwrap();

    let mut i = 0usize;
    c.bench_function("lookup_by_path_1k_docs", |b| {
        b.iter(|| {
            i = (i + 7) % 1000;
            engine
                .lookup(&format!("corpus/doc-{i:06}.pdf"))
                .unwrap()
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_persist_clusters, bench_lookup_by_path);
criterion_main!(benches);
