//! Document records as they move through the pipeline: discovered
//! file, computed fingerprint, canonical record.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::fingerprint::{ExactHash, FuzzySignature};
use crate::types::identifiers::DocId;

/// A file discovered by the corpus walker, before hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedDocument {
    pub path: PathBuf,
    /// Source collection the file was walked from.
    pub collection: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Output of the content hasher for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub document: ScannedDocument,
    pub exact_hash: ExactHash,
    pub fuzzy: FuzzySignature,
}

impl Fingerprint {
    /// Path rendered for storage and reports.
    pub fn path_str(&self) -> String {
        self.document.path.to_string_lossy().into_owned()
    }
}

/// Kind of secondary identifier attached to a canonical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// Exact content hash of a cluster member.
    Hash,
    /// Source path of a cluster member.
    Path,
    /// Identifier assigned by an external registry or prior system.
    External,
}

impl RefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Path => "path",
            Self::External => "external",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "hash" => Some(Self::Hash),
            "path" => Some(Self::Path),
            "external" => Some(Self::External),
            _ => None,
        }
    }
}

/// Secondary identifier pointing at a canonical document. The store
/// answers lookups by any of these as well as by canonical id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub kind: RefKind,
    pub value: String,
}

impl DocumentRef {
    pub fn hash(value: impl Into<String>) -> Self {
        Self { kind: RefKind::Hash, value: value.into() }
    }

    pub fn path(value: impl Into<String>) -> Self {
        Self { kind: RefKind::Path, value: value.into() }
    }

    pub fn external(value: impl Into<String>) -> Self {
        Self { kind: RefKind::External, value: value.into() }
    }
}

/// Canonical record for one duplicate cluster: the surviving identity
/// every member resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDocument {
    pub id: DocId,
    /// Exact hash of the representative member.
    pub exact_hash: ExactHash,
    /// Collection of the representative member.
    pub collection: String,
    /// Path of the representative member.
    pub representative_path: String,
    /// Number of members collapsed into this record, representative
    /// included.
    pub member_count: u32,
    pub first_seen_at: DateTime<Utc>,
}

impl CanonicalDocument {
    pub fn new(
        exact_hash: ExactHash,
        collection: impl Into<String>,
        representative_path: impl Into<String>,
        member_count: u32,
    ) -> Self {
        Self {
            id: DocId::derive(exact_hash.as_str()),
            exact_hash,
            collection: collection.into(),
            representative_path: representative_path.into(),
            member_count,
            first_seen_at: Utc::now(),
        }
    }
}
