//! Content-derived identifier types.
//!
//! Canonical ids are never random: a document id is a function of its
//! representative's exact hash, an entity id a function of its cleaned
//! name and kind. Re-running resolution over the same corpus therefore
//! reproduces the same ids, and ids survive across runs without a
//! mapping table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ID_DOMAIN_DOC, ID_DOMAIN_ENTITY};
use crate::types::entity::EntityKind;

/// Hex length of the truncated blake3 digest embedded in derived ids.
const ID_HEX_LEN: usize = 32;

fn derive_hex(domain: &str, parts: &[&[u8]]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain.as_bytes());
    for part in parts {
        // Length prefix keeps ("ab","c") and ("a","bc") distinct.
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    let hex = hasher.finalize().to_hex();
    hex[..ID_HEX_LEN].to_string()
}

/// Canonical document identifier, derived from the representative's
/// exact content hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Derive the canonical id for a document whose representative has
    /// the given exact hash (lowercase hex).
    pub fn derive(exact_hash_hex: &str) -> Self {
        Self(format!(
            "doc-{}",
            derive_hex(ID_DOMAIN_DOC, &[exact_hash_hex.as_bytes()])
        ))
    }

    /// Rehydrate an id previously persisted by this scheme.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical entity identifier, derived from cleaned name and kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Derive the canonical id for an entity from its cleaned name and
    /// kind tag. Same inputs always produce the same id.
    pub fn derive(cleaned_name: &str, kind: EntityKind) -> Self {
        Self(format!(
            "ent-{}",
            derive_hex(
                ID_DOMAIN_ENTITY,
                &[cleaned_name.as_bytes(), kind.as_str().as_bytes()]
            )
        ))
    }

    /// Rehydrate an id previously persisted by this scheme.
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one pipeline run, used to tag failure reports and
/// freshly minted entities. Not content-derived: two runs over the
/// same corpus still get distinct ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
