//! StoreEngine: owns the connection pool, runs migrations on open, and
//! exposes the store operations the pipeline and CLI call.

use std::path::Path;

use chrono::{DateTime, Utc};

use collate_core::config::StorageConfig;
use collate_core::errors::{CollateError, CollateResult, IngestError, StorageError};
use collate_core::types::{
    AliasBinding, CanonicalDocument, CanonicalEntity, ConsolidatedEdge, Correction, DocId,
    DocumentRef, EntityId, ExactHash, FailureRecord, Fingerprint, FuzzySignature, ResolvedCluster,
    RunId, RunReport, RunStats, ScannedDocument,
};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{document_ops, entity_ops, failure_ops, graph_ops, metadata_ops, run_ops};
use crate::to_storage_err;

/// The canonical store. One writer, pooled readers, transactional
/// batch writes.
pub struct StoreEngine {
    pool: ConnectionPool,
    /// When true, route reads through the read pool (file-backed mode).
    /// In-memory read pool connections are isolated databases, so
    /// in-memory mode routes all reads through the writer.
    use_read_pool: bool,
}

impl StoreEngine {
    /// Open a store backed by a file on disk.
    pub fn open(path: &Path, config: &StorageConfig) -> CollateResult<Self> {
        let pool = ConnectionPool::open(path, config)?;
        let engine = Self { pool, use_read_pool: true };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> CollateResult<Self> {
        let config = StorageConfig::default();
        let pool = ConnectionPool::open_in_memory(&config)?;
        let engine = Self { pool, use_read_pool: false };
        engine.initialize()?;
        Ok(engine)
    }

    /// Run migrations on the write connection.
    fn initialize(&self) -> CollateResult<()> {
        self.pool.writer.with_conn_sync(migrations::run_migrations)
    }

    /// The connection pool, for operations the engine doesn't wrap.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn with_reader<F, T>(&self, f: F) -> CollateResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> CollateResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn_sync(f)
        }
    }

    /// PRAGMA integrity_check. Errors with CorruptionDetected when the
    /// database reports anything but "ok".
    pub fn check_integrity(&self) -> CollateResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            let verdict: String = conn
                .pragma_query_value(None, "integrity_check", |row| row.get(0))
                .map_err(|e| to_storage_err(e.to_string()))?;
            if verdict.eq_ignore_ascii_case("ok") {
                Ok(())
            } else {
                Err(CollateError::StorageError(StorageError::CorruptionDetected {
                    details: verdict,
                }))
            }
        })
    }

    // Documents

    /// Persist a batch of resolved clusters atomically.
    pub fn persist_clusters(
        &self,
        clusters: &[ResolvedCluster],
        batch: &[Fingerprint],
    ) -> CollateResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| document_ops::upsert_clusters(conn, clusters, batch))
    }

    pub fn document(&self, id: &DocId) -> CollateResult<Option<CanonicalDocument>> {
        self.with_reader(|conn| document_ops::get_document(conn, id))
    }

    /// Resolve any identifier (canonical id, exact hash, member path,
    /// external id) to its canonical document.
    pub fn lookup(&self, query: &str) -> CollateResult<Option<CanonicalDocument>> {
        self.with_reader(|conn| document_ops::lookup(conn, query))
    }

    pub fn lookup_ref(&self, r: &DocumentRef) -> CollateResult<Option<CanonicalDocument>> {
        self.with_reader(|conn| document_ops::lookup_ref(conn, r))
    }

    pub fn refs_of(&self, id: &DocId) -> CollateResult<Vec<DocumentRef>> {
        self.with_reader(|conn| document_ops::refs_of(conn, id))
    }

    /// Every canonical document, ordered by id.
    pub fn all_documents(&self) -> CollateResult<Vec<CanonicalDocument>> {
        self.with_reader(document_ops::all_documents)
    }

    pub fn signature_of(&self, exact_hash: &ExactHash) -> CollateResult<Option<FuzzySignature>> {
        self.with_reader(|conn| document_ops::get_signature(conn, exact_hash))
    }

    pub fn document_count(&self) -> CollateResult<usize> {
        self.with_reader(document_ops::document_count)
    }

    // Fingerprint staleness cache

    /// The cached exact hash for a walked file, when its size and
    /// mtime still match what was recorded at hash time.
    pub fn cached_hash(&self, document: &ScannedDocument) -> CollateResult<Option<ExactHash>> {
        self.with_reader(|conn| metadata_ops::fresh_hash(conn, document))
    }

    /// Record the on-disk metadata of every fingerprinted file.
    pub fn persist_file_metadata(&self, fingerprints: &[Fingerprint]) -> CollateResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| metadata_ops::upsert_metadata_batch(conn, fingerprints))
    }

    // Entities

    /// Persist minted entities. Must run before aliases or edges that
    /// reference them.
    pub fn persist_entities(&self, entities: &[CanonicalEntity]) -> CollateResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| entity_ops::insert_entities(conn, entities))
    }

    pub fn entity(&self, id: &EntityId) -> CollateResult<Option<CanonicalEntity>> {
        self.with_reader(|conn| entity_ops::get_entity(conn, id))
    }

    /// Entities whose canonical name or any alias equals the cleaned
    /// query.
    pub fn lookup_entity_by_alias(&self, query: &str) -> CollateResult<Vec<CanonicalEntity>> {
        self.with_reader(|conn| entity_ops::entities_by_alias(conn, query))
    }

    /// Load every canonical entity, for warming the resolver registry.
    pub fn load_entities(&self) -> CollateResult<Vec<CanonicalEntity>> {
        self.with_reader(entity_ops::load_entities)
    }

    /// Associate entities with the canonical documents that mention
    /// them.
    pub fn link_entity_documents(&self, links: &[(EntityId, DocId, u64)]) -> CollateResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| entity_ops::link_documents(conn, links))
    }

    /// Canonical documents an entity appears in, with mention tallies.
    pub fn entity_documents(&self, id: &EntityId) -> CollateResult<Vec<(DocId, u64)>> {
        self.with_reader(|conn| entity_ops::documents_of(conn, id))
    }

    /// Total mention tally per entity, summed over its linked
    /// documents.
    pub fn entity_mention_totals(&self) -> CollateResult<Vec<(EntityId, u64)>> {
        self.with_reader(entity_ops::mention_totals)
    }

    pub fn entity_count(&self) -> CollateResult<usize> {
        self.with_reader(entity_ops::entity_count)
    }

    // Aliases and corrections

    pub fn persist_learned_aliases(&self, bindings: &[AliasBinding]) -> CollateResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| entity_ops::upsert_aliases(conn, bindings))
    }

    pub fn load_alias_bindings(&self) -> CollateResult<Vec<AliasBinding>> {
        self.with_reader(entity_ops::load_aliases)
    }

    /// Append a correction to the log. The target entity must already
    /// exist; corrections never mint.
    pub fn record_correction(&self, alias: &str, entity_id: &EntityId) -> CollateResult<()> {
        self.pool.writer.with_conn_sync(|conn| {
            if entity_ops::get_entity(conn, entity_id)?.is_none() {
                return Err(CollateError::EntityNotFound {
                    id: entity_id.as_str().to_string(),
                });
            }
            entity_ops::record_correction(conn, alias, entity_id)
        })
    }

    pub fn load_corrections(&self) -> CollateResult<Vec<Correction>> {
        self.with_reader(entity_ops::load_corrections)
    }

    // Graph

    pub fn persist_edges(&self, edges: &[ConsolidatedEdge]) -> CollateResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| graph_ops::upsert_edges(conn, edges))
    }

    pub fn edges_of(&self, id: &EntityId) -> CollateResult<Vec<ConsolidatedEdge>> {
        self.with_reader(|conn| graph_ops::edges_of(conn, id))
    }

    pub fn all_edges(&self) -> CollateResult<Vec<ConsolidatedEdge>> {
        self.with_reader(graph_ops::all_edges)
    }

    pub fn edge_count(&self) -> CollateResult<usize> {
        self.with_reader(graph_ops::edge_count)
    }

    // Failures and runs

    pub fn record_failures(&self, run: &RunId, failures: &[IngestError]) -> CollateResult<usize> {
        self.pool
            .writer
            .with_conn_sync(|conn| failure_ops::record_failures(conn, run, failures))
    }

    pub fn failures_for_run(&self, run: &RunId) -> CollateResult<Vec<FailureRecord>> {
        self.with_reader(|conn| failure_ops::failures_for_run(conn, run))
    }

    pub fn record_run(
        &self,
        run: &RunId,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        stats: &RunStats,
    ) -> CollateResult<()> {
        self.pool
            .writer
            .with_conn_sync(|conn| run_ops::record_run(conn, run, started_at, finished_at, stats))
    }

    pub fn run_stats(&self, run: &RunId) -> CollateResult<Option<RunStats>> {
        self.with_reader(|conn| run_ops::run_stats(conn, run))
    }

    /// Rebuild the report for a recorded run: stats from the run row,
    /// failures from the failure table.
    pub fn run_report(&self, run: &RunId) -> CollateResult<Option<RunReport>> {
        let Some((started_at, finished_at, stats)) =
            self.with_reader(|conn| run_ops::get_run(conn, run))?
        else {
            return Ok(None);
        };
        let failures = self.failures_for_run(run)?;
        Ok(Some(RunReport {
            run: run.clone(),
            started_at,
            finished_at: finished_at.unwrap_or(started_at),
            stats: stats.unwrap_or_default(),
            failures,
        }))
    }
}
