//! Corpus walker over configured collection roots.
//!
//! Walks each collection directory, applies include globs and the size
//! cap, and returns a batch sorted by (collection, path) so downstream
//! stages see the same ordering on every run over the same corpus.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::{debug, warn};

use collate_core::config::CorpusConfig;
use collate_core::types::ScannedDocument;

/// Counters describing one corpus walk.
#[derive(Debug, Clone, Default)]
pub struct WalkStats {
    /// Files accepted into the batch.
    pub total_files: usize,
    /// Files rejected by the include globs.
    pub files_skipped: usize,
    /// Files rejected by the size cap.
    pub oversize_skipped: usize,
    /// Total bytes across accepted files.
    pub total_bytes: u64,
    pub duration: Duration,
}

/// Result of walking every configured collection.
#[derive(Debug)]
pub struct WalkOutcome {
    pub documents: Vec<ScannedDocument>,
    pub stats: WalkStats,
    /// Walk-level errors (unreadable directories, broken entries).
    /// These never abort the walk.
    pub errors: Vec<String>,
}

/// Corpus file walker.
pub struct CorpusWalker {
    config: CorpusConfig,
    include: GlobSet,
}

impl CorpusWalker {
    /// Create a walker for the given corpus configuration. Invalid
    /// include patterns are dropped with a warning.
    pub fn new(config: CorpusConfig) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.include {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern = %pattern, error = %e, "dropping invalid include glob"),
            }
        }
        let include = builder
            .build()
            .unwrap_or_else(|_| GlobSet::empty());

        Self { config, include }
    }

    /// Walk every collection root and collect the document batch.
    pub fn walk(&self) -> WalkOutcome {
        let start = Instant::now();
        let mut documents = Vec::new();
        let mut errors = Vec::new();
        let mut stats = WalkStats::default();

        for source in &self.config.collections {
            self.walk_collection(&source.name, &source.path, &mut documents, &mut stats, &mut errors);
        }

        // Deterministic batch order regardless of directory iteration.
        documents.sort_by(|a, b| {
            (a.collection.as_str(), a.path.as_path()).cmp(&(b.collection.as_str(), b.path.as_path()))
        });

        stats.total_files = documents.len();
        stats.duration = start.elapsed();

        debug!(
            files = stats.total_files,
            skipped = stats.files_skipped,
            oversize = stats.oversize_skipped,
            "corpus walk complete"
        );

        WalkOutcome { documents, stats, errors }
    }

    fn walk_collection(
        &self,
        collection: &str,
        root: &Path,
        documents: &mut Vec<ScannedDocument>,
        stats: &mut WalkStats,
        errors: &mut Vec<String>,
    ) {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(true)
            .follow_links(self.config.follow_symlinks)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    errors.push(format!("{collection}: {e}"));
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if !self.include.is_empty() && !self.include.is_match(relative) {
                stats.files_skipped += 1;
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    errors.push(format!("{}: {e}", path.display()));
                    continue;
                }
            };
            let size_bytes = metadata.len();
            if size_bytes > self.config.max_file_size {
                warn!(
                    path = %path.display(),
                    size = size_bytes,
                    max = self.config.max_file_size,
                    "skipping oversize file"
                );
                stats.oversize_skipped += 1;
                continue;
            }

            stats.total_bytes += size_bytes;
            documents.push(ScannedDocument {
                path: path.to_path_buf(),
                collection: collection.to_string(),
                size_bytes,
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collate_core::config::CollectionSource;
    use std::fs;

    fn config_for(dir: &Path, name: &str) -> CorpusConfig {
        CorpusConfig {
            collections: vec![CollectionSource {
                name: name.to_string(),
                path: dir.to_path_buf(),
            }],
            ..CorpusConfig::default()
        }
    }

    #[test]
    fn walk_is_sorted_and_complete() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF-1.4 two").unwrap();
        fs::write(dir.path().join("a.pdf"), b"%PDF-1.4 one").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.pdf"), b"%PDF-1.4 three").unwrap();

        let outcome = CorpusWalker::new(config_for(dir.path(), "estate-archive")).walk();
        assert_eq!(outcome.documents.len(), 3);
        assert!(outcome.errors.is_empty());
        let paths: Vec<_> = outcome
            .documents
            .iter()
            .map(|d| d.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(paths, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn include_globs_filter_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("scan.pdf"), b"%PDF-1.4").unwrap();
        fs::write(dir.path().join("notes.txt"), b"notes").unwrap();

        let mut config = config_for(dir.path(), "press-scan");
        config.include = vec!["*.pdf".to_string()];
        let outcome = CorpusWalker::new(config).walk();
        assert_eq!(outcome.documents.len(), 1);
        assert_eq!(outcome.stats.files_skipped, 1);
    }

    #[test]
    fn oversize_files_are_skipped_with_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.pdf"), vec![0x25; 64]).unwrap();
        fs::write(dir.path().join("small.pdf"), b"%PDF-tiny").unwrap();

        let mut config = config_for(dir.path(), "court-records");
        config.max_file_size = 32;
        let outcome = CorpusWalker::new(config).walk();
        assert_eq!(outcome.documents.len(), 1);
        assert_eq!(outcome.stats.oversize_skipped, 1);
    }

    #[test]
    fn collections_keep_their_labels() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        fs::write(dir_a.path().join("x.pdf"), b"%PDF a").unwrap();
        fs::write(dir_b.path().join("y.pdf"), b"%PDF b").unwrap();

        let config = CorpusConfig {
            collections: vec![
                CollectionSource { name: "court-records".into(), path: dir_a.path().to_path_buf() },
                CollectionSource { name: "press-scan".into(), path: dir_b.path().to_path_buf() },
            ],
            ..CorpusConfig::default()
        };
        let outcome = CorpusWalker::new(config).walk();
        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.documents[0].collection, "court-records");
        assert_eq!(outcome.documents[1].collection, "press-scan");
    }
}
