//! v002: entities, aliases, entity_documents, corrections.

use rusqlite::Connection;

use collate_core::errors::CollateResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> CollateResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entities (
            id           TEXT PRIMARY KEY,
            cleaned_name TEXT NOT NULL,
            display_name TEXT NOT NULL,
            kind         TEXT NOT NULL,
            minted_in    TEXT NOT NULL,
            created_at   TEXT NOT NULL,
            UNIQUE (cleaned_name, kind)
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities(kind);

        CREATE TABLE IF NOT EXISTS aliases (
            alias       TEXT PRIMARY KEY,
            entity_id   TEXT NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            source      TEXT NOT NULL,
            recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_aliases_entity ON aliases(entity_id);

        CREATE TABLE IF NOT EXISTS entity_documents (
            entity_id   TEXT NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
            document_id TEXT NOT NULL,
            mentions    INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (entity_id, document_id)
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_entity_documents_doc ON entity_documents(document_id);

        CREATE TABLE IF NOT EXISTS corrections (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            alias       TEXT NOT NULL,
            entity_id   TEXT NOT NULL,
            recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        ) STRICT;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
