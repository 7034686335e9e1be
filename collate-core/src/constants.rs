//! Shared constants for the collate identity-resolution pipeline.

/// Collate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version tag baked into every derived identifier.
///
/// Bump this whenever the similarity threshold, the tie-break policy,
/// or the id derivation scheme changes, so ids minted under the old
/// scheme can never collide with ids minted under the new one.
pub const ID_SCHEME_VERSION: u32 = 1;

/// Domain separator for document id derivation.
pub const ID_DOMAIN_DOC: &str = "collate/doc/v1";

/// Domain separator for entity id derivation.
pub const ID_DOMAIN_ENTITY: &str = "collate/entity/v1";

/// Number of MinHash lanes in a fuzzy signature.
pub const MINHASH_LANES: usize = 128;

/// Byte width of the sliding content shingle.
pub const SHINGLE_WIDTH: usize = 8;

/// LSH band count over the MinHash lanes.
pub const LSH_BANDS: usize = 16;

/// Lanes per LSH band (`MINHASH_LANES / LSH_BANDS`).
pub const LSH_ROWS_PER_BAND: usize = 8;

/// Default estimated-Jaccard threshold for fuzzy duplicate merging.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.80;

/// Default collection priority for canonical selection, best first.
/// Collections absent from the list rank below every listed one.
pub const DEFAULT_COLLECTION_PRIORITY: &[&str] = &[
    "court-records",
    "agency-release",
    "estate-archive",
    "press-scan",
];

/// Maximum file size in bytes for fingerprinting (default: 256MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 268_435_456;

/// Default number of hashing threads (0 = auto-detect).
pub const DEFAULT_THREADS: usize = 0;

/// Default maximum per-token edit distance for fuzzy mention matching.
pub const DEFAULT_MAX_EDIT_DISTANCE: usize = 2;

/// Default Jaro-Winkler floor for fuzzy mention matching.
pub const DEFAULT_JARO_WINKLER_FLOOR: f64 = 0.90;

/// Minimum token length treated as a truncation prefix rather than noise.
pub const MIN_TRUNCATION_PREFIX: usize = 2;

/// Default capacity of the per-run mention resolution cache.
pub const DEFAULT_MENTION_CACHE_CAPACITY: u64 = 100_000;

/// Batch writer batch size.
pub const BATCH_WRITE_SIZE: usize = 500;

/// Batch writer channel capacity.
pub const BATCH_CHANNEL_CAPACITY: usize = 1024;

/// Batch writer recv timeout in milliseconds.
pub const BATCH_RECV_TIMEOUT_MS: u64 = 100;
