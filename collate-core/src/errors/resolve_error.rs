//! Resolution errors: clustering, selection, alias handling.

/// Errors that can occur during duplicate clustering and canonical
/// selection. The mention normalizer itself never fails; alias
/// snapshot loading can.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot select a representative from an empty cluster")]
    EmptyCluster,

    #[error("invalid alias entry {alias:?}: {reason}")]
    InvalidAlias { alias: String, reason: String },

    #[error("alias file {path} unreadable: {reason}")]
    AliasFileUnreadable { path: String, reason: String },
}
