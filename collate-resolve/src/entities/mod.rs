//! Entity mention resolution.
//!
//! `clean` holds the text normalization primitives, `aliases` the
//! immutable per-run snapshot plus correction folding, `normalizer`
//! the resolution ladder itself.

pub mod aliases;
pub mod clean;
pub mod normalizer;

pub use aliases::AliasSnapshot;
pub use normalizer::{EntityRegistry, MentionNormalizer};
