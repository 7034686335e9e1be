//! v001: documents, document_refs, fingerprints, file_metadata, runs,
//! ingest_failures.

use rusqlite::Connection;

use collate_core::errors::CollateResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CollateResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id                  TEXT PRIMARY KEY,
            exact_hash          TEXT NOT NULL UNIQUE,
            collection          TEXT NOT NULL,
            representative_path TEXT NOT NULL,
            member_count        INTEGER NOT NULL DEFAULT 1,
            first_seen_at       TEXT NOT NULL,
            updated_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);

        CREATE TABLE IF NOT EXISTS document_refs (
            ref_kind    TEXT NOT NULL,
            ref_value   TEXT NOT NULL,
            document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            PRIMARY KEY (ref_kind, ref_value)
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_refs_document ON document_refs(document_id);

        CREATE TABLE IF NOT EXISTS fingerprints (
            exact_hash TEXT PRIMARY KEY REFERENCES documents(exact_hash) ON DELETE CASCADE,
            signature  BLOB NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS file_metadata (
            path        TEXT PRIMARY KEY,
            size_bytes  INTEGER NOT NULL,
            modified_at TEXT,
            exact_hash  TEXT NOT NULL,
            hashed_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        ) STRICT;

        CREATE TABLE IF NOT EXISTS runs (
            id          TEXT PRIMARY KEY,
            started_at  TEXT NOT NULL,
            finished_at TEXT,
            stats       TEXT
        ) STRICT;

        CREATE TABLE IF NOT EXISTS ingest_failures (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id      TEXT NOT NULL,
            path        TEXT NOT NULL,
            kind        TEXT NOT NULL,
            detail      TEXT NOT NULL,
            recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_failures_run ON ingest_failures(run_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
