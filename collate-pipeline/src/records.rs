//! Interchange records from the external extraction step.
//!
//! Mentions and edges arrive as JSON arrays produced by whatever NER
//! or co-occurrence tooling ran upstream. The shapes here are the
//! wire contract; `EdgeRecord` maps into the internal `RawEdge` before
//! consolidation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use collate_core::errors::{CollateResult, PipelineError};
use collate_core::types::{EdgeFlags, EntityKind, RawEdge};

/// One raw entity mention as delivered by the extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionRecord {
    /// The mention string exactly as extracted, OCR artifacts and all.
    pub raw: String,
    #[serde(default)]
    pub kind_hint: Option<EntityKind>,
    /// Any identifier the store can resolve: canonical id, exact
    /// hash, member path, or external ref.
    pub document_ref: String,
    /// Occurrence weight within the referenced document.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// One raw relationship edge keyed by mention strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub raw_source: String,
    pub raw_target: String,
    pub rel_type: String,
    pub weight: f64,
    #[serde(default)]
    pub flags: EdgeFlags,
}

fn default_weight() -> f64 {
    1.0
}

impl EdgeRecord {
    pub fn into_raw(self) -> RawEdge {
        RawEdge {
            source: self.raw_source,
            target: self.raw_target,
            rel_type: self.rel_type,
            weight: self.weight,
            flags: self.flags,
        }
    }
}

/// Load a JSON array of mention records.
pub fn load_mentions(path: &Path) -> CollateResult<Vec<MentionRecord>> {
    read_records(path)
}

/// Load a JSON array of edge records, mapped into `RawEdge`s.
pub fn load_edges(path: &Path) -> CollateResult<Vec<RawEdge>> {
    let records: Vec<EdgeRecord> = read_records(path)?;
    Ok(records.into_iter().map(EdgeRecord::into_raw).collect())
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> CollateResult<Vec<T>> {
    let unreadable = |reason: String| PipelineError::RecordsUnreadable {
        path: path.to_path_buf(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    let records = serde_json::from_str(&raw).map_err(|e| unreadable(e.to_string()))?;
    Ok(records)
}
