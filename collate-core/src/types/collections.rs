//! Re-exports of performance-oriented collection types.

pub use rustc_hash::{FxHashMap, FxHashSet};
pub use smallvec::SmallVec;
pub use std::collections::BTreeMap;

/// SmallVec optimized for cluster members (usually <4 duplicates).
pub type SmallVec4<T> = SmallVec<[T; 4]>;

/// SmallVec optimized for document refs (usually hash + path).
pub type SmallVec2<T> = SmallVec<[T; 2]>;

/// SmallVec sized for the LSH band keys of one signature.
pub type BandVec<T> = SmallVec<[T; 16]>;
