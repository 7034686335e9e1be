// Single source of truth for all default values.

use crate::constants;

// --- Corpus ---
pub const DEFAULT_MAX_FILE_SIZE: u64 = constants::DEFAULT_MAX_FILE_SIZE;
pub const DEFAULT_THREADS: usize = constants::DEFAULT_THREADS;
pub const DEFAULT_FOLLOW_SYMLINKS: bool = false;

// --- Clustering ---
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = constants::DEFAULT_SIMILARITY_THRESHOLD;

// --- Entities ---
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = constants::DEFAULT_MAX_EDIT_DISTANCE;
pub const DEFAULT_JARO_WINKLER_FLOOR: f64 = constants::DEFAULT_JARO_WINKLER_FLOOR;
pub const DEFAULT_MENTION_CACHE_CAPACITY: u64 = constants::DEFAULT_MENTION_CACHE_CAPACITY;

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "collate.db";
pub const DEFAULT_WAL_MODE: bool = true;
pub const DEFAULT_MMAP_SIZE: u64 = 268_435_456; // 256 MB
pub const DEFAULT_CACHE_SIZE: i64 = -64_000; // 64 MB (negative = KB)
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
