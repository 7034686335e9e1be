use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// One source collection: a named directory tree of scanned documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSource {
    /// Collection label recorded with every document from this root.
    pub name: String,
    /// Directory to walk.
    pub path: PathBuf,
}

/// Corpus walking and fingerprinting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Source collections to walk, in declaration order.
    pub collections: Vec<CollectionSource>,
    /// Glob patterns selecting files to fingerprint. Empty = all files.
    pub include: Vec<String>,
    /// Files larger than this are skipped with a warning.
    pub max_file_size: u64,
    /// Hashing worker threads (0 = one per core).
    pub threads: usize,
    /// Follow symlinks while walking.
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            include: Vec::new(),
            max_file_size: defaults::DEFAULT_MAX_FILE_SIZE,
            threads: defaults::DEFAULT_THREADS,
            follow_symlinks: defaults::DEFAULT_FOLLOW_SYMLINKS,
        }
    }
}
