//! # collate CLI
//!
//! Operator surface for the collate batch pipeline: run identity
//! resolution over a configured corpus, export the consolidated
//! graph, and query the canonical store.
//!
//! ## Usage
//!
//! ```bash
//! collate --config ./collate.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `collate run` | Walk, fingerprint, cluster, and resolve one batch |
//! | `collate export-graph` | Write the persisted graph as JSON |
//! | `collate lookup <query>` | Resolve any identifier to its canonical document |
//! | `collate entities <query>` | Find canonical entities by name or alias |
//! | `collate report <run>` | Print the recorded report for a run |
//!
//! Log levels come from `COLLATE_LOG`, e.g.
//! `COLLATE_LOG=collate_pipeline=debug,collate_storage=info`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use collate_core::config::CollateConfig;
use collate_core::tracing::init_tracing;
use collate_core::types::RunId;
use collate_pipeline::{export_from_store, load_edges, load_mentions, write_export, BatchRunner};
use collate_resolve::entities::clean;
use collate_storage::StoreEngine;

/// collate: offline identity resolution for scanned-document
/// corpora.
///
/// All commands read a TOML configuration file naming the collection
/// roots, the store path, and the resolution thresholds.
#[derive(Parser)]
#[command(
    name = "collate",
    about = "Offline identity resolution for scanned-document corpora",
    version,
    long_about = "Collapses near-duplicate scanned documents into canonical records and \
    name-variant entity mentions into canonical entities, with full provenance and a \
    consolidated relationship graph that stays stable under repeated batch re-runs."
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(long, global = true, default_value = "./collate.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one batch over the configured corpus.
    ///
    /// Walks every collection root, fingerprints changed files,
    /// clusters duplicates, selects canonical records, resolves any
    /// supplied mention and edge records, and persists the result.
    /// Re-running over an unchanged corpus is a no-op with the same
    /// ids.
    Run {
        /// JSON file of raw mention records from the extraction step.
        #[arg(long)]
        mentions: Option<PathBuf>,

        /// JSON file of raw relationship edges from the extraction
        /// step.
        #[arg(long)]
        edges: Option<PathBuf>,

        /// Write this run's graph export here after the batch.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export every re-keyed raw edge instead of the merged view.
        /// Only available at run time; the store keeps merged edges.
        #[arg(long, requires = "export")]
        raw: bool,
    },

    /// Write the persisted graph as JSON.
    ///
    /// Builds the merged (deduplicated) view from stored entities,
    /// edges, and mention tallies.
    ExportGraph {
        /// Output path.
        #[arg(long, default_value = "graph.json")]
        out: PathBuf,
    },

    /// Resolve any identifier to its canonical document.
    ///
    /// Accepts a canonical id, an exact content hash, any member
    /// file path, or an external ref, and prints the canonical
    /// record with all of its refs.
    Lookup {
        /// The identifier to resolve.
        query: String,
    },

    /// Find canonical entities by name or alias.
    Entities {
        /// Name or alias; cleaned the same way mentions are.
        query: String,
    },

    /// Print the recorded report for a run.
    Report {
        /// Run id as printed by `collate run`.
        run: String,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = CollateConfig::from_file(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let store = StoreEngine::open(Path::new(&config.storage.db_path), &config.storage)
        .with_context(|| format!("opening store at {}", config.storage.db_path))?;

    match cli.command {
        Commands::Run { mentions, edges, export, raw } => {
            run_batch(&config, &store, mentions, edges, export, raw)
        }
        Commands::ExportGraph { out } => export_graph(&store, &out),
        Commands::Lookup { query } => lookup(&store, &query),
        Commands::Entities { query } => entities(&store, &query),
        Commands::Report { run } => report(&store, &run),
    }
}

fn run_batch(
    config: &CollateConfig,
    store: &StoreEngine,
    mentions: Option<PathBuf>,
    edges: Option<PathBuf>,
    export: Option<PathBuf>,
    raw: bool,
) -> anyhow::Result<()> {
    let mentions = match mentions {
        Some(path) => load_mentions(&path)?,
        None => Vec::new(),
    };
    let edges = match edges {
        Some(path) => load_edges(&path)?,
        None => Vec::new(),
    };

    let runner = BatchRunner::new(config.clone());
    let outcome = runner.run(store, &mentions, &edges)?;
    let stats = &outcome.report.stats;

    println!(
        "run {} finished in {:.1}s",
        outcome.report.run.as_str(),
        stats.scan.duration.as_secs_f64()
    );
    println!(
        "  documents: {} canonical from {} files ({} cache hits, {} skipped)",
        stats.documents_written, stats.scan.files_seen, stats.scan.cache_hits,
        stats.scan.files_skipped
    );
    println!(
        "  entities: {} minted, {} aliases learned",
        stats.entities_minted, stats.aliases_learned
    );
    println!(
        "  graph: {} edges written, {} self-loops flagged",
        stats.edges_written, stats.self_loops
    );
    if !outcome.report.failures.is_empty() {
        println!(
            "  failures: {} (see `collate report {}`)",
            outcome.report.failures.len(),
            outcome.report.run.as_str()
        );
    }

    if let Some(path) = export {
        let graph = if raw { outcome.raw_export() } else { outcome.dedup_export() };
        write_export(&path, &graph)?;
        println!("  graph exported to {}", path.display());
    }
    Ok(())
}

fn export_graph(store: &StoreEngine, out: &Path) -> anyhow::Result<()> {
    let export = export_from_store(store)?;
    write_export(out, &export)?;
    println!(
        "exported {} nodes, {} edges to {}",
        export.node_count,
        export.edge_count,
        out.display()
    );
    Ok(())
}

fn lookup(store: &StoreEngine, query: &str) -> anyhow::Result<()> {
    let Some(document) = store.lookup(query)? else {
        anyhow::bail!("no canonical document matches {query:?}");
    };
    let refs = store.refs_of(&document.id)?;
    let rendered = serde_json::json!({ "document": document, "refs": refs });
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

fn entities(store: &StoreEngine, query: &str) -> anyhow::Result<()> {
    let cleaned = clean::clean(query);
    let matches = store.lookup_entity_by_alias(&cleaned)?;
    if matches.is_empty() {
        anyhow::bail!("no canonical entity matches {query:?}");
    }
    for entity in &matches {
        let documents = store.entity_documents(&entity.id)?;
        println!(
            "{}  {}  ({}, {} documents)",
            entity.id.as_str(),
            entity.display_name,
            entity.kind.as_str(),
            documents.len()
        );
    }
    Ok(())
}

fn report(store: &StoreEngine, run: &str) -> anyhow::Result<()> {
    let run = RunId::from_stored(run);
    let Some(report) = store.run_report(&run)? else {
        anyhow::bail!("no run recorded with id {}", run.as_str());
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
