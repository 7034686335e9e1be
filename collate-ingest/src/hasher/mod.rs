//! Content hasher: one fingerprint per document.
//!
//! The exact hash is a blake3 digest over the raw bytes; the fuzzy
//! signature is a MinHash over sliding byte shingles. Both are pure
//! functions of content, so re-hashing an unchanged corpus reproduces
//! the batch bit for bit.

pub mod minhash;
pub mod validate;

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, warn};

use collate_core::constants::BATCH_CHANNEL_CAPACITY;
use collate_core::errors::IngestError;
use collate_core::types::{ExactHash, Fingerprint, ScannedDocument};

/// Fingerprint one document: read, validate, hash.
pub fn fingerprint(document: &ScannedDocument) -> Result<Fingerprint, IngestError> {
    let content = read_stable(&document.path)?;
    validate::check(&content, &document.path)?;

    let exact_hash = ExactHash::new(blake3::hash(&content).to_hex().to_string());
    let fuzzy = minhash::signature(&content);

    Ok(Fingerprint {
        document: document.clone(),
        exact_hash,
        fuzzy,
    })
}

/// Read a file and confirm it did not change underneath the read.
/// A mid-read change yields a transient `HashComputation` error; the
/// batch layer retries those once.
fn read_stable(path: &Path) -> Result<Vec<u8>, IngestError> {
    let io_err = |source| IngestError::Io { path: path.to_path_buf(), source };

    let before = fs::metadata(path).map_err(io_err)?;
    let content = fs::read(path).map_err(io_err)?;
    let after = fs::metadata(path).map_err(io_err)?;

    let moved = before.len() != after.len()
        || before.modified().ok() != after.modified().ok();
    if moved {
        return Err(IngestError::HashComputation {
            path: path.to_path_buf(),
            detail: format!(
                "file changed while hashing ({} -> {} bytes)",
                before.len(),
                after.len()
            ),
        });
    }
    Ok(content)
}

/// Result of fingerprinting one batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Fingerprints sorted by (collection, path), the walker's
    /// ordering, minus the failed documents.
    pub fingerprints: Vec<Fingerprint>,
    /// Per-document failures, sorted by path. These are reported,
    /// never fatal.
    pub failures: Vec<IngestError>,
    /// Documents that needed a retry after a transient failure.
    pub retried: usize,
}

/// Fingerprint a batch: rayon workers hash files and feed a bounded
/// channel; one collector thread drains it. Transient failures are
/// retried once; documents that still fail are dropped from the batch
/// and reported in the outcome.
pub fn fingerprint_batch(documents: &[ScannedDocument]) -> BatchOutcome {
    let retried = AtomicUsize::new(0);
    let (tx, rx) =
        crossbeam_channel::bounded::<Result<Fingerprint, IngestError>>(BATCH_CHANNEL_CAPACITY);

    let (mut fingerprints, mut failures) = std::thread::scope(|scope| {
        let collector = scope.spawn(move || {
            let mut fingerprints = Vec::new();
            let mut failures = Vec::new();
            for result in rx {
                match result {
                    Ok(fp) => fingerprints.push(fp),
                    Err(e) => failures.push(e),
                }
            }
            (fingerprints, failures)
        });

        documents.par_iter().for_each_with(tx, |tx, document| {
            // The receiver outlives every sender, so send only fails
            // if the collector panicked; join surfaces that below.
            let _ = tx.send(hash_with_retry(document, &retried));
        });

        match collector.join() {
            Ok(collected) => collected,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });

    // Channel arrival order depends on worker scheduling; restore the
    // walker's ordering.
    fingerprints.sort_by(|a, b| {
        (&a.document.collection, &a.document.path)
            .cmp(&(&b.document.collection, &b.document.path))
    });
    failures.sort_by(|a, b| a.path().cmp(b.path()));

    if !failures.is_empty() {
        warn!(failed = failures.len(), "batch completed with failed documents");
    }

    BatchOutcome {
        fingerprints,
        failures,
        retried: retried.load(Ordering::Relaxed),
    }
}

fn hash_with_retry(
    document: &ScannedDocument,
    retried: &AtomicUsize,
) -> Result<Fingerprint, IngestError> {
    let first = match fingerprint(document) {
        Ok(fp) => return Ok(fp),
        Err(e) => e,
    };
    if first.is_transient() {
        retried.fetch_add(1, Ordering::Relaxed);
        debug!(path = %document.path.display(), "retrying transient hash failure");
        return fingerprint(document);
    }
    Err(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use collate_core::config::CollectionSource;
    use collate_core::config::CorpusConfig;
    use std::fs;

    fn scanned(path: &Path, collection: &str) -> ScannedDocument {
        let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        ScannedDocument {
            path: path.to_path_buf(),
            collection: collection.to_string(),
            size_bytes: len,
            modified_at: None,
        }
    }

    #[test]
    fn identical_content_identical_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, b"scanned page content, first revision").unwrap();
        fs::write(&b, b"scanned page content, first revision").unwrap();

        let fa = fingerprint(&scanned(&a, "court-records")).unwrap();
        let fb = fingerprint(&scanned(&b, "press-scan")).unwrap();
        assert_eq!(fa.exact_hash, fb.exact_hash);
        assert_eq!(fa.fuzzy, fb.fuzzy);
    }

    #[test]
    fn different_content_different_exact_hash() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, b"first revision").unwrap();
        fs::write(&b, b"second revision").unwrap();

        let fa = fingerprint(&scanned(&a, "c")).unwrap();
        let fb = fingerprint(&scanned(&b, "c")).unwrap();
        assert_ne!(fa.exact_hash, fb.exact_hash);
    }

    #[test]
    fn zero_byte_file_is_corrupt_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        fs::write(&path, b"").unwrap();

        let err = fingerprint(&scanned(&path, "c")).unwrap_err();
        assert!(matches!(err, IngestError::CorruptInput { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = fingerprint(&scanned(Path::new("/nonexistent/file.pdf"), "c")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }

    #[test]
    fn batch_reports_failures_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.bin");
        let empty = dir.path().join("empty.bin");
        fs::write(&good, b"readable content").unwrap();
        fs::write(&empty, b"").unwrap();

        let docs = vec![scanned(&empty, "c"), scanned(&good, "c")];
        let outcome = fingerprint_batch(&docs);
        assert_eq!(outcome.fingerprints.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0], IngestError::CorruptInput { .. }));
    }

    #[test]
    fn batch_preserves_document_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut docs = Vec::new();
        for i in 0..8 {
            let path = dir.path().join(format!("doc{i}.bin"));
            fs::write(&path, format!("content number {i}")).unwrap();
            docs.push(scanned(&path, "c"));
        }
        let outcome = fingerprint_batch(&docs);
        let produced: Vec<_> = outcome
            .fingerprints
            .iter()
            .map(|f| f.document.path.clone())
            .collect();
        let expected: Vec<_> = docs.iter().map(|d| d.path.clone()).collect();
        assert_eq!(produced, expected);
    }

    // Walker output feeds fingerprint_batch without conversion.
    #[test]
    fn walker_and_hasher_compose() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.bin"), b"one").unwrap();
        fs::write(dir.path().join("two.bin"), b"two").unwrap();

        let config = CorpusConfig {
            collections: vec![CollectionSource {
                name: "estate-archive".into(),
                path: dir.path().to_path_buf(),
            }],
            ..CorpusConfig::default()
        };
        let walk = crate::walker::CorpusWalker::new(config).walk();
        let outcome = fingerprint_batch(&walk.documents);
        assert_eq!(outcome.fingerprints.len(), 2);
        assert!(outcome.failures.is_empty());
    }
}
