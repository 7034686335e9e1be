//! Relationship graph consolidation.
//!
//! Raw edges arrive keyed by mention strings. Consolidation resolves
//! both endpoints through the normalizer, merges edges that now share
//! (source, target, rel_type), sums their weights, ORs their flags,
//! and keeps self-loops flagged rather than dropped: an entity
//! related to itself after merging usually marks an upstream
//! extraction bug worth auditing.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use collate_core::types::{
    AliasBinding, CanonicalEntity, ConsolidatedEdge, EntityId, EntityKind, EntityMention,
    RawEdge,
};

use crate::entities::MentionNormalizer;

/// One raw edge after endpoint resolution, before merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RekeyedEdge {
    pub source: EntityId,
    pub target: EntityId,
    pub rel_type: String,
    /// Mention strings as they appeared upstream.
    pub source_mention: String,
    pub target_mention: String,
    pub weight: f64,
    pub flags: collate_core::types::EdgeFlags,
}

/// Result of consolidating one edge batch.
#[derive(Debug)]
pub struct ConsolidationOutcome {
    /// Merged canonical edges, sorted by (source, target, rel_type).
    pub edges: Vec<ConsolidatedEdge>,
    /// Every raw edge re-keyed, input order preserved. Feeds the raw
    /// export mode.
    pub rekeyed: Vec<RekeyedEdge>,
    /// Entities minted while resolving endpoints.
    pub minted: Vec<CanonicalEntity>,
    /// Alias bindings learned while resolving endpoints.
    pub learned: Vec<AliasBinding>,
    /// Merged edges whose endpoints collapsed together.
    pub self_loops: usize,
}

pub struct GraphConsolidator;

impl GraphConsolidator {
    pub fn new() -> Self {
        Self
    }

    /// Consolidate a batch of raw edges against the given normalizer.
    pub fn consolidate(
        &self,
        edges: &[RawEdge],
        normalizer: &mut MentionNormalizer,
    ) -> ConsolidationOutcome {
        let mut rekeyed = Vec::with_capacity(edges.len());
        let mut minted = Vec::new();
        let mut learned = Vec::new();

        for edge in edges {
            let source = self.resolve_endpoint(&edge.source, normalizer, &mut minted, &mut learned);
            let target = self.resolve_endpoint(&edge.target, normalizer, &mut minted, &mut learned);
            let mut flags = edge.flags;
            if source == target {
                flags.self_referential = true;
            }
            rekeyed.push(RekeyedEdge {
                source,
                target,
                rel_type: edge.rel_type.clone(),
                source_mention: edge.source.clone(),
                target_mention: edge.target.clone(),
                weight: edge.weight,
                flags,
            });
        }

        // Merge by (source, target, rel_type). Insertion order seeds
        // the map, but the final sort makes the output
        // order-independent.
        let mut merged: FxHashMap<(EntityId, EntityId, String), ConsolidatedEdge> =
            FxHashMap::default();
        for edge in &rekeyed {
            let key = (edge.source.clone(), edge.target.clone(), edge.rel_type.clone());
            merged
                .entry(key)
                .and_modify(|m| {
                    m.weight += edge.weight;
                    m.merged_from += 1;
                    m.flags = m.flags.merge(&edge.flags);
                })
                .or_insert_with(|| ConsolidatedEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    rel_type: edge.rel_type.clone(),
                    weight: edge.weight,
                    merged_from: 1,
                    flags: edge.flags,
                });
        }

        let mut out: Vec<ConsolidatedEdge> = merged.into_values().collect();
        out.sort_by(|a, b| {
            (&a.source, &a.target, &a.rel_type).cmp(&(&b.source, &b.target, &b.rel_type))
        });

        let self_loops = out.iter().filter(|e| e.source == e.target).count();
        if self_loops > 0 {
            warn!(self_loops, "consolidation produced self-referential edges");
        }
        debug!(
            raw = edges.len(),
            merged = out.len(),
            minted = minted.len(),
            "graph consolidation complete"
        );

        ConsolidationOutcome { edges: out, rekeyed, minted, learned, self_loops }
    }

    fn resolve_endpoint(
        &self,
        mention: &str,
        normalizer: &mut MentionNormalizer,
        minted: &mut Vec<CanonicalEntity>,
        learned: &mut Vec<AliasBinding>,
    ) -> EntityId {
        let resolution = normalizer.resolve(&EntityMention::new(mention));
        if let Some(entity) = resolution.minted {
            minted.push(entity);
        }
        if let Some(binding) = resolution.learned {
            learned.push(binding);
        }
        resolution.entity_id
    }
}

impl Default for GraphConsolidator {
    fn default() -> Self {
        Self::new()
    }
}

/// One node in a graph export. Counts are derived at export time, not
/// read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    /// Raw mentions that resolved to this entity during the run.
    pub mention_count: u64,
    /// Edges incident to this node; a self-loop counts once.
    pub connection_count: u64,
}

/// One edge in a graph export. Mention strings are carried only in
/// the raw view, where each entry is one unmerged upstream edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub source: EntityId,
    pub target: EntityId,
    pub rel_type: String,
    pub weight: f64,
    /// 1 in the raw view.
    pub merged_from: u32,
    pub flags: collate_core::types::EdgeFlags,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_mention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_mention: Option<String>,
}

impl From<&ConsolidatedEdge> for ExportEdge {
    fn from(edge: &ConsolidatedEdge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            rel_type: edge.rel_type.clone(),
            weight: edge.weight,
            merged_from: edge.merged_from,
            flags: edge.flags,
            source_mention: None,
            target_mention: None,
        }
    }
}

impl From<&RekeyedEdge> for ExportEdge {
    fn from(edge: &RekeyedEdge) -> Self {
        Self {
            source: edge.source.clone(),
            target: edge.target.clone(),
            rel_type: edge.rel_type.clone(),
            weight: edge.weight,
            merged_from: 1,
            flags: edge.flags,
            source_mention: Some(edge.source_mention.clone()),
            target_mention: Some(edge.target_mention.clone()),
        }
    }
}

/// Serializable graph export document.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphExport {
    /// False for the raw audit view.
    pub deduplicated: bool,
    pub generated_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<ExportEdge>,
}

impl GraphExport {
    /// Dedup export: merged canonical edges, the serving view.
    pub fn dedup(nodes: Vec<GraphNode>, edges: &[ConsolidatedEdge]) -> Self {
        let edges: Vec<ExportEdge> = edges.iter().map(ExportEdge::from).collect();
        Self {
            deduplicated: true,
            generated_at: Utc::now(),
            node_count: nodes.len(),
            edge_count: edges.len(),
            nodes,
            edges,
        }
    }

    /// Raw export: every edge re-keyed but unmerged, the audit view.
    pub fn raw(nodes: Vec<GraphNode>, rekeyed: &[RekeyedEdge]) -> Self {
        let edges: Vec<ExportEdge> = rekeyed.iter().map(ExportEdge::from).collect();
        Self {
            deduplicated: false,
            generated_at: Utc::now(),
            node_count: nodes.len(),
            edge_count: edges.len(),
            nodes,
            edges,
        }
    }
}

/// Assemble export nodes: one per canonical entity, sorted by id,
/// with connection counts derived from the given endpoint pairs.
pub fn build_nodes<'a>(
    entities: impl IntoIterator<Item = &'a CanonicalEntity>,
    mention_counts: &FxHashMap<EntityId, u64>,
    endpoints: impl IntoIterator<Item = (&'a EntityId, &'a EntityId)>,
) -> Vec<GraphNode> {
    let mut connections: FxHashMap<&EntityId, u64> = FxHashMap::default();
    for (source, target) in endpoints {
        *connections.entry(source).or_default() += 1;
        if source != target {
            *connections.entry(target).or_default() += 1;
        }
    }

    let mut nodes: Vec<GraphNode> = entities
        .into_iter()
        .map(|entity| GraphNode {
            id: entity.id.clone(),
            name: entity.display_name.clone(),
            kind: entity.kind,
            mention_count: mention_counts.get(&entity.id).copied().unwrap_or(0),
            connection_count: connections.get(&entity.id).copied().unwrap_or(0),
        })
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    nodes
}
