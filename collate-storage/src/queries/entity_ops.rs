//! Canonical entity rows, alias bindings, and the correction log.

use rusqlite::{params, Connection, OptionalExtension};

use collate_core::errors::CollateResult;
use collate_core::types::{
    AliasBinding, AliasSource, CanonicalEntity, Correction, DocId, EntityId, EntityKind, RunId,
};

use super::parse_timestamp;
use crate::{to_storage_err, to_txn_err};

/// Insert one canonical entity. Ids are content-derived, so a repeat
/// insert of the same entity is a no-op.
pub fn insert_entity(conn: &Connection, entity: &CanonicalEntity) -> CollateResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO entities (
            id, cleaned_name, display_name, kind, minted_in, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entity.id.as_str(),
            entity.cleaned_name,
            entity.display_name,
            entity.kind.as_str(),
            entity.minted_in.as_str(),
            entity.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Insert a batch of entities in one transaction.
pub fn insert_entities(conn: &Connection, entities: &[CanonicalEntity]) -> CollateResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_txn_err(format!("insert_entities begin: {e}")))?;

    match entities.iter().try_for_each(|entity| insert_entity(&tx, entity)) {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_txn_err(format!("insert_entities commit: {e}")))?;
            Ok(entities.len())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// Fetch one entity by id.
pub fn get_entity(conn: &Connection, id: &EntityId) -> CollateResult<Option<CanonicalEntity>> {
    let row = conn
        .query_row(
            "SELECT id, cleaned_name, display_name, kind, minted_in, created_at
             FROM entities WHERE id = ?1",
            params![id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match row {
        Some(fields) => Ok(Some(entity_from_row(fields)?)),
        None => Ok(None),
    }
}

/// Load every canonical entity, ordered by id for reproducibility.
pub fn load_entities(conn: &Connection) -> CollateResult<Vec<CanonicalEntity>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, cleaned_name, display_name, kind, minted_in, created_at
             FROM entities ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut entities = Vec::new();
    for row in rows {
        let fields = row.map_err(|e| to_storage_err(e.to_string()))?;
        entities.push(entity_from_row(fields)?);
    }
    Ok(entities)
}

type EntityRow = (String, String, String, String, String, String);

fn entity_from_row(
    (id, cleaned_name, display_name, kind, minted_in, created_at): EntityRow,
) -> CollateResult<CanonicalEntity> {
    let kind = EntityKind::parse(&kind)
        .ok_or_else(|| to_storage_err(format!("unknown entity kind {kind:?}")))?;
    Ok(CanonicalEntity {
        id: EntityId::from_stored(id),
        cleaned_name,
        display_name,
        kind,
        minted_in: RunId::from_stored(minted_in),
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

/// Record an alias binding learned during a run. IGNORE keeps the
/// first binding stable if a later run learns the same alias.
pub fn upsert_alias(conn: &Connection, binding: &AliasBinding) -> CollateResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO aliases (alias, entity_id, source) VALUES (?1, ?2, ?3)",
        params![
            binding.alias,
            binding.entity_id.as_str(),
            binding.source.as_str(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Record a batch of learned aliases in one transaction.
pub fn upsert_aliases(conn: &Connection, bindings: &[AliasBinding]) -> CollateResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_txn_err(format!("upsert_aliases begin: {e}")))?;

    match bindings.iter().try_for_each(|binding| upsert_alias(&tx, binding)) {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_txn_err(format!("upsert_aliases commit: {e}")))?;
            Ok(bindings.len())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// Load every stored alias binding.
pub fn load_aliases(conn: &Connection) -> CollateResult<Vec<AliasBinding>> {
    let mut stmt = conn
        .prepare("SELECT alias, entity_id, source FROM aliases ORDER BY alias")
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut bindings = Vec::new();
    for row in rows {
        let (alias, entity_id, source) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let source = AliasSource::parse(&source)
            .ok_or_else(|| to_storage_err(format!("unknown alias source {source:?}")))?;
        bindings.push(AliasBinding {
            alias,
            entity_id: EntityId::from_stored(entity_id),
            source,
        });
    }
    Ok(bindings)
}

/// Append one correction to the log. The log is never rewritten; the
/// next snapshot applies corrections in recorded order.
pub fn record_correction(conn: &Connection, alias: &str, entity_id: &EntityId) -> CollateResult<()> {
    conn.execute(
        "INSERT INTO corrections (alias, entity_id) VALUES (?1, ?2)",
        params![alias, entity_id.as_str()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Load the correction log in recorded order.
pub fn load_corrections(conn: &Connection) -> CollateResult<Vec<Correction>> {
    let mut stmt = conn
        .prepare("SELECT alias, entity_id, recorded_at FROM corrections ORDER BY id")
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut corrections = Vec::new();
    for row in rows {
        let (alias, entity_id, recorded_at) = row.map_err(|e| to_storage_err(e.to_string()))?;
        corrections.push(Correction {
            alias,
            entity_id: EntityId::from_stored(entity_id),
            recorded_at: parse_timestamp(&recorded_at, "recorded_at")?,
        });
    }
    Ok(corrections)
}

/// Entities whose canonical name or any alias equals the query. The
/// query is expected in cleaned form; callers normalize before
/// calling. Distinct aliases can bind to distinct entities, so this
/// returns every match, ordered by id.
pub fn entities_by_alias(conn: &Connection, query: &str) -> CollateResult<Vec<CanonicalEntity>> {
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT e.id, e.cleaned_name, e.display_name, e.kind, e.minted_in, e.created_at
             FROM entities e
             LEFT JOIN aliases a ON a.entity_id = e.id
             WHERE e.cleaned_name = ?1 OR a.alias = ?1
             ORDER BY e.id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![query], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut entities = Vec::new();
    for row in rows {
        let fields = row.map_err(|e| to_storage_err(e.to_string()))?;
        entities.push(entity_from_row(fields)?);
    }
    Ok(entities)
}

/// Associate an entity with a canonical document it was mentioned in.
/// REPLACE: each run's mention tally for the pair is authoritative.
pub fn link_document(
    conn: &Connection,
    entity_id: &EntityId,
    document_id: &DocId,
    mentions: u64,
) -> CollateResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO entity_documents (entity_id, document_id, mentions)
         VALUES (?1, ?2, ?3)",
        params![entity_id.as_str(), document_id.as_str(), mentions],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Record a batch of entity-document links in one transaction.
pub fn link_documents(
    conn: &Connection,
    links: &[(EntityId, DocId, u64)],
) -> CollateResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_txn_err(format!("link_documents begin: {e}")))?;

    match links
        .iter()
        .try_for_each(|(entity, document, mentions)| link_document(&tx, entity, document, *mentions))
    {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_txn_err(format!("link_documents commit: {e}")))?;
            Ok(links.len())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// Canonical documents an entity appears in, with mention tallies,
/// ordered by document id.
pub fn documents_of(conn: &Connection, entity_id: &EntityId) -> CollateResult<Vec<(DocId, u64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT document_id, mentions FROM entity_documents
             WHERE entity_id = ?1 ORDER BY document_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![entity_id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut links = Vec::new();
    for row in rows {
        let (document_id, mentions) = row.map_err(|e| to_storage_err(e.to_string()))?;
        links.push((DocId::from_stored(document_id), mentions));
    }
    Ok(links)
}

/// Total mention tally per entity across every linked document,
/// ordered by entity id. Feeds graph exports built from the store.
pub fn mention_totals(conn: &Connection) -> CollateResult<Vec<(EntityId, u64)>> {
    let mut stmt = conn
        .prepare(
            "SELECT entity_id, SUM(mentions) FROM entity_documents
             GROUP BY entity_id ORDER BY entity_id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?)))
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut totals = Vec::new();
    for row in rows {
        let (entity_id, mentions) = row.map_err(|e| to_storage_err(e.to_string()))?;
        totals.push((EntityId::from_stored(entity_id), mentions));
    }
    Ok(totals)
}

/// Number of canonical entities.
pub fn entity_count(conn: &Connection) -> CollateResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entities", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}
