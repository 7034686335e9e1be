//! Read pool + write connection under concurrent load.

use std::sync::Arc;

use collate_core::config::StorageConfig;
use collate_core::constants::MINHASH_LANES;
use collate_core::types::{
    CanonicalDocument, DocumentRef, ExactHash, Fingerprint, FuzzySignature, ResolvedCluster,
    ScannedDocument,
};
use collate_storage::StoreEngine;

fn cluster_for(i: usize) -> (Vec<Fingerprint>, ResolvedCluster) {
    let hash = format!("hash-{i:04}");
    let path = format!("corpus/doc-{i:04}.pdf");
    let batch = vec![Fingerprint {
        document: ScannedDocument {
            path: path.clone().into(),
            collection: "court-records".to_string(),
            size_bytes: 512,
            modified_at: None,
        },
        exact_hash: ExactHash::new(hash.clone()),
        fuzzy: FuzzySignature::from_lanes(vec![i as u64; MINHASH_LANES]),
    }];
    let canonical = CanonicalDocument::new(ExactHash::new(hash.clone()), "court-records", &path, 1);
    let refs = vec![DocumentRef::hash(hash), DocumentRef::path(path)];
    (batch, ResolvedCluster { canonical, refs, members: vec![0] })
}

#[test]
fn concurrent_reads_during_writes() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(
        StoreEngine::open(&dir.path().join("concurrent.db"), &StorageConfig::default()).unwrap(),
    );

    for i in 0..10 {
        let (batch, cluster) = cluster_for(i);
        engine.persist_clusters(&[cluster], &batch).unwrap();
    }

    let mut handles = vec![];
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(std::thread::spawn(move || {
            for i in 0..50 {
                let doc = engine
                    .lookup(&format!("corpus/doc-{:04}.pdf", i % 10))
                    .unwrap();
                assert!(doc.is_some());
            }
        }));
    }

    // Keep writing while the readers hammer the pool.
    for i in 10..30 {
        let (batch, cluster) = cluster_for(i);
        engine.persist_clusters(&[cluster], &batch).unwrap();
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.document_count().unwrap(), 30);
}
