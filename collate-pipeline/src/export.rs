//! Graph export assembly and serialization.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::info;

use collate_core::errors::{CollateResult, PipelineError};
use collate_resolve::graph::build_nodes;
use collate_resolve::GraphExport;
use collate_storage::StoreEngine;

/// Build the merged serving view from persisted state. The raw view
/// cannot be rebuilt here: raw mention keys are not persisted per
/// edge, so it only exists on a live `RunOutcome`.
pub fn export_from_store(store: &StoreEngine) -> CollateResult<GraphExport> {
    let entities = store.load_entities()?;
    let edges = store.all_edges()?;
    let mention_counts: FxHashMap<_, _> = store.entity_mention_totals()?.into_iter().collect();
    let endpoints = edges.iter().map(|e| (&e.source, &e.target));
    let nodes = build_nodes(entities.iter(), &mention_counts, endpoints);
    Ok(GraphExport::dedup(nodes, &edges))
}

/// Serialize an export as pretty-printed JSON.
pub fn write_export(path: &Path, export: &GraphExport) -> CollateResult<()> {
    let failed = |reason: String| PipelineError::ExportFailed {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::create(path).map_err(|e| failed(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, export).map_err(|e| failed(e.to_string()))?;
    writer.flush().map_err(|e| failed(e.to_string()))?;

    info!(
        path = %path.display(),
        nodes = export.node_count,
        edges = export.edge_count,
        deduplicated = export.deduplicated,
        "graph export written"
    );
    Ok(())
}
