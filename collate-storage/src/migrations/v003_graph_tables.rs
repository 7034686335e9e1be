//! v003: graph_edges.

use rusqlite::Connection;

use collate_core::errors::CollateResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CollateResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS graph_edges (
            source_id        TEXT NOT NULL REFERENCES entities(id),
            target_id        TEXT NOT NULL REFERENCES entities(id),
            rel_type         TEXT NOT NULL,
            weight           REAL NOT NULL,
            merged_from      INTEGER NOT NULL DEFAULT 1,
            corroborated     INTEGER NOT NULL DEFAULT 0,
            inferred         INTEGER NOT NULL DEFAULT 0,
            self_referential INTEGER NOT NULL DEFAULT 0,
            updated_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (source_id, target_id, rel_type)
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_edges_source ON graph_edges(source_id);
        CREATE INDEX IF NOT EXISTS idx_edges_target ON graph_edges(target_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
