//! Relationship graph records, before and after consolidation.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::EntityId;

/// Boolean attributes carried on an edge. Consolidation ORs them
/// across merged edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeFlags {
    /// Relationship confirmed by more than one source document.
    #[serde(default)]
    pub corroborated: bool,
    /// Relationship inferred rather than stated.
    #[serde(default)]
    pub inferred: bool,
    /// Both endpoints resolved to the same canonical entity.
    #[serde(default)]
    pub self_referential: bool,
}

impl EdgeFlags {
    /// OR-combine with another flag set.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            corroborated: self.corroborated || other.corroborated,
            inferred: self.inferred || other.inferred,
            self_referential: self.self_referential || other.self_referential,
        }
    }
}

/// An edge as delivered by the upstream extraction step, keyed by raw
/// mention strings plus a relationship type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    /// Relationship type; edges merge only within one type.
    pub rel_type: String,
    pub weight: f64,
    #[serde(default)]
    pub flags: EdgeFlags,
}

/// An edge after consolidation. At most one edge exists per
/// (source, target, rel_type) triple; collapsing raw edges sum their
/// weights into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedEdge {
    pub source: EntityId,
    pub target: EntityId,
    pub rel_type: String,
    /// Sum of the weights of every merged raw edge.
    pub weight: f64,
    /// Number of raw edges merged into this one.
    pub merged_from: u32,
    pub flags: EdgeFlags,
}
