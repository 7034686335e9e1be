//! Batch runner: one pass over the corpus, phase by phase.
//!
//! Phase 1: walk → Phase 2: staleness check → Phase 3: fingerprint →
//! Phase 4: cluster → Phase 5: select → Phase 6: persist documents →
//! Phase 7: normalizer assembly → Phase 8: mentions → Phase 9: graph
//! consolidation → Phase 10: persist resolution → Phase 11: report.
//!
//! Per-file failures are collected, never fatal; a run either
//! completes or leaves the store at its last committed state, and
//! re-running over the same corpus reproduces the same ids.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::Utc;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use collate_core::config::CollateConfig;
use collate_core::errors::{CollateResult, PipelineError};
use collate_core::types::{
    AliasSource, DocId, EntityId, EntityMention, FailureRecord, Fingerprint, RawEdge, RunId,
    RunReport, RunStats, ScanStats, ScannedDocument,
};
use collate_ingest::{fingerprint_batch, CorpusWalker};
use collate_resolve::graph::{build_nodes, ConsolidationOutcome};
use collate_resolve::{
    AliasSnapshot, CanonicalSelector, DuplicateClusterer, EntityRegistry, GraphConsolidator,
    GraphExport, GraphNode, MentionNormalizer, SelectionPolicy,
};
use collate_storage::StoreEngine;

use crate::records::MentionRecord;

/// Everything one batch run produced beyond what was persisted.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    /// Nodes derived from this run's entities and mention tallies.
    pub nodes: Vec<GraphNode>,
    /// Consolidation output, kept because the raw re-keyed view only
    /// exists at run time; the store holds merged edges.
    pub graph: ConsolidationOutcome,
}

impl RunOutcome {
    /// Merged serving view of this run's graph.
    pub fn dedup_export(&self) -> GraphExport {
        GraphExport::dedup(self.nodes.clone(), &self.graph.edges)
    }

    /// Audit view: every raw edge re-keyed but not merged.
    pub fn raw_export(&self) -> GraphExport {
        GraphExport::raw(self.nodes.clone(), &self.graph.rekeyed)
    }
}

/// Orchestrates batch runs against one store. A runner admits one run
/// at a time; a second concurrent call gets `AlreadyRunning`.
pub struct BatchRunner {
    config: CollateConfig,
    running: AtomicBool,
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl BatchRunner {
    pub fn new(config: CollateConfig) -> Self {
        Self { config, running: AtomicBool::new(false) }
    }

    /// Run one batch: fingerprint the corpus, resolve identities,
    /// persist, and report.
    pub fn run(
        &self,
        store: &StoreEngine,
        mentions: &[MentionRecord],
        edges: &[RawEdge],
    ) -> CollateResult<RunOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PipelineError::AlreadyRunning.into());
        }
        let _guard = RunGuard(&self.running);

        let run = RunId::new();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(run = %run.as_str(), "batch run starting");

        if self.config.corpus.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.corpus.threads)
                .build_global()
                .ok();
        }

        // Phase 1: corpus walk.
        let walk = CorpusWalker::new(self.config.corpus.clone()).walk();
        for error in &walk.errors {
            warn!(error = %error, "walk error");
        }
        info!(
            files = walk.stats.total_files,
            skipped = walk.stats.files_skipped + walk.stats.oversize_skipped,
            bytes = walk.stats.total_bytes,
            "Phase 1: corpus walk complete"
        );

        // Phase 2: split walked files into cache hits and hash work.
        let mut fingerprints: Vec<Fingerprint> = Vec::new();
        let mut pending: Vec<ScannedDocument> = Vec::new();
        for document in walk.documents {
            match self.cached_fingerprint(store, &document)? {
                Some(fp) => fingerprints.push(fp),
                None => pending.push(document),
            }
        }
        let cache_hits = fingerprints.len();
        info!(cache_hits, to_hash = pending.len(), "Phase 2: staleness check complete");

        // Phase 3: fingerprint what the cache missed.
        let batch = fingerprint_batch(&pending);
        let files_hashed = batch.fingerprints.len();
        info!(
            hashed = files_hashed,
            failures = batch.failures.len(),
            retried = batch.retried,
            "Phase 3: fingerprinting complete"
        );
        fingerprints.extend(batch.fingerprints);
        // Cache hits and fresh hashes interleave; restore the
        // walker's (collection, path) ordering so clustering sees a
        // stable batch.
        fingerprints.sort_by(|a, b| {
            (&a.document.collection, &a.document.path)
                .cmp(&(&b.document.collection, &b.document.path))
        });

        // Phase 4: duplicate clustering.
        let clusterer = DuplicateClusterer::new(self.config.cluster.similarity_threshold);
        let clustered = clusterer.cluster(&fingerprints);
        info!(
            clusters = clustered.clusters.len(),
            exact_groups = clustered.stats.exact_groups,
            fuzzy_merges = clustered.stats.fuzzy_merges,
            "Phase 4: clustering complete"
        );

        // Phase 5: canonical selection.
        let selector = CanonicalSelector::new(SelectionPolicy::new(
            self.config.cluster.collection_priority.clone(),
        ));
        let resolved = selector.select_all(&fingerprints, &clustered)?;
        info!(canonical = resolved.len(), "Phase 5: canonical selection complete");

        // Phase 6: persist canonical documents and the metadata cache.
        let documents_written = store.persist_clusters(&resolved, &fingerprints)?;
        store.persist_file_metadata(&fingerprints)?;
        info!(documents = documents_written, "Phase 6: documents persisted");

        // Phase 7: assemble the run's normalizer.
        let mut normalizer = self.build_normalizer(store, &run)?;
        info!(
            known = normalizer.known_entities(),
            snapshot = normalizer.snapshot_version(),
            "Phase 7: normalizer ready"
        );

        // Phase 8: resolve mentions, tally document links.
        let mut minted = Vec::new();
        let mut learned = Vec::new();
        let mut mention_weights: FxHashMap<EntityId, f64> = FxHashMap::default();
        let mut link_weights: FxHashMap<(EntityId, DocId), f64> = FxHashMap::default();
        let mut unresolved_refs = 0usize;
        for record in mentions {
            let mention = EntityMention { raw: record.raw.clone(), kind_hint: record.kind_hint };
            let resolution = normalizer.resolve(&mention);
            if let Some(entity) = resolution.minted {
                minted.push(entity);
            }
            if let Some(binding) = resolution.learned {
                learned.push(binding);
            }
            *mention_weights.entry(resolution.entity_id.clone()).or_default() += record.weight;
            match store.lookup(&record.document_ref)? {
                Some(document) => {
                    *link_weights
                        .entry((resolution.entity_id, document.id))
                        .or_default() += record.weight;
                }
                None => {
                    unresolved_refs += 1;
                    debug!(
                        document_ref = %record.document_ref,
                        "mention references no known document"
                    );
                }
            }
        }
        if unresolved_refs > 0 {
            warn!(unresolved_refs, "mention document refs the store cannot resolve; links dropped");
        }
        info!(
            mentions = mentions.len(),
            minted = minted.len(),
            "Phase 8: mention resolution complete"
        );

        // Phase 9: graph consolidation.
        let graph = GraphConsolidator::new().consolidate(edges, &mut normalizer);
        minted.extend(graph.minted.iter().cloned());
        learned.extend(graph.learned.iter().cloned());
        info!(
            raw = edges.len(),
            merged = graph.edges.len(),
            self_loops = graph.self_loops,
            "Phase 9: graph consolidation complete"
        );

        // Phase 10: persist entities first, then what references them.
        let entities_minted = store.persist_entities(&minted)?;
        let aliases_learned = store.persist_learned_aliases(&learned)?;
        let edges_written = store.persist_edges(&graph.edges)?;
        let links = rounded_links(link_weights);
        store.link_entity_documents(&links)?;
        info!(
            entities = entities_minted,
            aliases = aliases_learned,
            edges = edges_written,
            links = links.len(),
            "Phase 10: resolution persisted"
        );

        // Phase 11: failures and the run row.
        store.record_failures(&run, &batch.failures)?;
        let finished_at = Utc::now();
        let stats = RunStats {
            scan: ScanStats {
                files_seen: walk.stats.total_files,
                files_skipped: walk.stats.files_skipped + walk.stats.oversize_skipped,
                cache_hits,
                files_hashed,
                retries: batch.retried,
                failures: batch.failures.len(),
                total_bytes: walk.stats.total_bytes,
                duration: start.elapsed(),
            },
            clusters: clustered.stats,
            documents_written,
            entities_minted,
            aliases_learned,
            edges_written,
            self_loops: graph.self_loops,
        };
        store.record_run(&run, started_at, finished_at, &stats)?;

        let failures: Vec<FailureRecord> = batch
            .failures
            .iter()
            .map(|failure| FailureRecord {
                path: failure.path().display().to_string(),
                kind: failure.kind(),
                detail: failure.to_string(),
                recorded_at: finished_at,
            })
            .collect();

        let known = store.load_entities()?;
        let mention_counts = rounded_mentions(mention_weights);
        let endpoints = graph.edges.iter().map(|e| (&e.source, &e.target));
        let nodes = build_nodes(known.iter(), &mention_counts, endpoints);

        info!(
            run = %run.as_str(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Phase 11: batch run complete"
        );
        Ok(RunOutcome {
            report: RunReport { run, started_at, finished_at, stats, failures },
            nodes,
            graph,
        })
    }

    /// Rebuild a fingerprint from the store when the file's size and
    /// mtime still match its recorded metadata and the signature for
    /// that hash is still present.
    fn cached_fingerprint(
        &self,
        store: &StoreEngine,
        document: &ScannedDocument,
    ) -> CollateResult<Option<Fingerprint>> {
        let Some(exact_hash) = store.cached_hash(document)? else {
            return Ok(None);
        };
        let Some(fuzzy) = store.signature_of(&exact_hash)? else {
            return Ok(None);
        };
        Ok(Some(Fingerprint { document: document.clone(), exact_hash, fuzzy }))
    }

    /// The run's alias snapshot and warm registry. Seed file first,
    /// stored bindings over it, corrections folded last with a
    /// version bump.
    fn build_normalizer(
        &self,
        store: &StoreEngine,
        run: &RunId,
    ) -> CollateResult<MentionNormalizer> {
        let seed = match &self.config.entities.alias_seed_path {
            Some(path) => AliasSnapshot::load_seed(Path::new(path))?,
            None => AliasSnapshot::empty(),
        };
        let mut bindings = seed.to_bindings(AliasSource::Seed);
        bindings.extend(store.load_alias_bindings()?);
        let snapshot = AliasSnapshot::from_bindings(seed.version(), bindings)?;
        let corrections = store.load_corrections()?;
        let snapshot = if corrections.is_empty() {
            snapshot
        } else {
            snapshot.with_corrections(&corrections)
        };

        let entities = store.load_entities()?;
        let registry = EntityRegistry::from_entities(entities.iter());
        Ok(MentionNormalizer::new(
            snapshot,
            registry,
            self.config.entities.clone(),
            run.clone(),
        ))
    }
}

/// Collapse fractional mention weights into the integral tallies the
/// document-link table stores. Sub-unit weights still count once.
fn rounded_links(weights: FxHashMap<(EntityId, DocId), f64>) -> Vec<(EntityId, DocId, u64)> {
    let mut links: Vec<(EntityId, DocId, u64)> = weights
        .into_iter()
        .map(|((entity, document), weight)| (entity, document, (weight.round() as u64).max(1)))
        .collect();
    links.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
    links
}

fn rounded_mentions(weights: FxHashMap<EntityId, f64>) -> FxHashMap<EntityId, u64> {
    weights
        .into_iter()
        .map(|(entity, weight)| (entity, (weight.round() as u64).max(1)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_link_weights_round_but_never_vanish() {
        let mut weights: FxHashMap<(EntityId, DocId), f64> = FxHashMap::default();
        weights.insert(
            (EntityId::from_stored("ent-a"), DocId::from_stored("doc-1")),
            0.2,
        );
        weights.insert(
            (EntityId::from_stored("ent-a"), DocId::from_stored("doc-2")),
            2.6,
        );

        let links = rounded_links(weights);
        assert_eq!(
            links,
            vec![
                (EntityId::from_stored("ent-a"), DocId::from_stored("doc-1"), 1),
                (EntityId::from_stored("ent-a"), DocId::from_stored("doc-2"), 3),
            ]
        );
    }
}
