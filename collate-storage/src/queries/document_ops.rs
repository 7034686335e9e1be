//! Canonical document upserts and lookups.

use rusqlite::{params, Connection, OptionalExtension};

use collate_core::errors::{CollateError, CollateResult, StorageError};
use collate_core::types::{
    CanonicalDocument, DocId, DocumentRef, ExactHash, Fingerprint, FuzzySignature, RefKind,
    ResolvedCluster,
};

use super::parse_timestamp;
use crate::{to_storage_err, to_txn_err};

/// Upsert one canonical document. Re-upserting the same id refreshes
/// the representative and member count but keeps first_seen_at.
pub fn upsert_document(conn: &Connection, doc: &CanonicalDocument) -> CollateResult<()> {
    conn.execute(
        "INSERT INTO documents (
            id, exact_hash, collection, representative_path, member_count, first_seen_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            collection = excluded.collection,
            representative_path = excluded.representative_path,
            member_count = excluded.member_count,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![
            doc.id.as_str(),
            doc.exact_hash.as_str(),
            doc.collection,
            doc.representative_path,
            doc.member_count,
            doc.first_seen_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Attach secondary identifiers to a canonical document. REPLACE so a
/// path whose content changed repoints to its new canonical record.
pub fn add_refs(conn: &Connection, id: &DocId, refs: &[DocumentRef]) -> CollateResult<()> {
    let mut stmt = conn
        .prepare(
            "INSERT OR REPLACE INTO document_refs (ref_kind, ref_value, document_id)
             VALUES (?1, ?2, ?3)",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    for r in refs {
        stmt.execute(params![r.kind.as_str(), r.value, id.as_str()])
            .map_err(|e| to_storage_err(e.to_string()))?;
    }
    Ok(())
}

/// Store the fuzzy signature for an exact hash.
pub fn store_signature(
    conn: &Connection,
    exact_hash: &ExactHash,
    signature: &FuzzySignature,
) -> CollateResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO fingerprints (exact_hash, signature) VALUES (?1, ?2)",
        params![exact_hash.as_str(), signature.to_bytes()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Persist a batch of resolved clusters in one transaction: canonical
/// rows, secondary refs, and each representative's fuzzy signature.
pub fn upsert_clusters(
    conn: &Connection,
    clusters: &[ResolvedCluster],
    batch: &[Fingerprint],
) -> CollateResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_txn_err(format!("upsert_clusters begin: {e}")))?;

    match upsert_clusters_inner(&tx, clusters, batch) {
        Ok(written) => {
            tx.commit()
                .map_err(|e| to_txn_err(format!("upsert_clusters commit: {e}")))?;
            Ok(written)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn upsert_clusters_inner(
    conn: &Connection,
    clusters: &[ResolvedCluster],
    batch: &[Fingerprint],
) -> CollateResult<usize> {
    for cluster in clusters {
        upsert_document(conn, &cluster.canonical)?;
        add_refs(conn, &cluster.canonical.id, &cluster.refs)?;
        if let Some(representative) = cluster.members.first().and_then(|&m| batch.get(m)) {
            store_signature(conn, &representative.exact_hash, &representative.fuzzy)?;
        }
    }
    Ok(clusters.len())
}

/// Fetch a canonical document by its id.
pub fn get_document(conn: &Connection, id: &DocId) -> CollateResult<Option<CanonicalDocument>> {
    let row = conn
        .query_row(
            "SELECT id, exact_hash, collection, representative_path, member_count, first_seen_at
             FROM documents WHERE id = ?1",
            params![id.as_str()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match row {
        Some((id, exact_hash, collection, representative_path, member_count, first_seen)) => {
            Ok(Some(CanonicalDocument {
                id: DocId::from_stored(id),
                exact_hash: ExactHash::new(exact_hash),
                collection,
                representative_path,
                member_count,
                first_seen_at: parse_timestamp(&first_seen, "first_seen_at")?,
            }))
        }
        None => Ok(None),
    }
}

/// Load every canonical document, ordered by id for reproducibility.
pub fn all_documents(conn: &Connection) -> CollateResult<Vec<CanonicalDocument>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, exact_hash, collection, representative_path, member_count, first_seen_at
             FROM documents ORDER BY id",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, String>(5)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut documents = Vec::new();
    for row in rows {
        let (id, exact_hash, collection, representative_path, member_count, first_seen) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        documents.push(CanonicalDocument {
            id: DocId::from_stored(id),
            exact_hash: ExactHash::new(exact_hash),
            collection,
            representative_path,
            member_count,
            first_seen_at: parse_timestamp(&first_seen, "first_seen_at")?,
        });
    }
    Ok(documents)
}

/// Resolve a secondary identifier to its canonical document.
pub fn lookup_ref(conn: &Connection, r: &DocumentRef) -> CollateResult<Option<CanonicalDocument>> {
    let id: Option<String> = conn
        .query_row(
            "SELECT document_id FROM document_refs WHERE ref_kind = ?1 AND ref_value = ?2",
            params![r.kind.as_str(), r.value],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match id {
        Some(id) => get_document(conn, &DocId::from_stored(id)),
        None => Ok(None),
    }
}

/// Resolve any identifier string: canonical id first, then secondary
/// refs of any kind.
pub fn lookup(conn: &Connection, query: &str) -> CollateResult<Option<CanonicalDocument>> {
    if let Some(doc) = get_document(conn, &DocId::from_stored(query))? {
        return Ok(Some(doc));
    }
    let id: Option<String> = conn
        .query_row(
            "SELECT document_id FROM document_refs WHERE ref_value = ?1 LIMIT 1",
            params![query],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match id {
        Some(id) => get_document(conn, &DocId::from_stored(id)),
        None => Ok(None),
    }
}

/// All secondary identifiers of a canonical document.
pub fn refs_of(conn: &Connection, id: &DocId) -> CollateResult<Vec<DocumentRef>> {
    let mut stmt = conn
        .prepare(
            "SELECT ref_kind, ref_value FROM document_refs
             WHERE document_id = ?1 ORDER BY ref_kind, ref_value",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params![id.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut refs = Vec::new();
    for row in rows {
        let (kind, value) = row.map_err(|e| to_storage_err(e.to_string()))?;
        let kind = RefKind::parse(&kind)
            .ok_or_else(|| to_storage_err(format!("unknown ref kind {kind:?}")))?;
        refs.push(DocumentRef { kind, value });
    }
    Ok(refs)
}

/// Fetch the stored fuzzy signature for an exact hash.
pub fn get_signature(conn: &Connection, exact_hash: &ExactHash) -> CollateResult<Option<FuzzySignature>> {
    let blob: Option<Vec<u8>> = conn
        .query_row(
            "SELECT signature FROM fingerprints WHERE exact_hash = ?1",
            params![exact_hash.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match blob {
        Some(bytes) => match FuzzySignature::from_bytes(&bytes) {
            Some(signature) => Ok(Some(signature)),
            None => Err(CollateError::StorageError(StorageError::CorruptionDetected {
                details: format!(
                    "fingerprint blob for {} has length {}",
                    exact_hash.as_str(),
                    bytes.len()
                ),
            })),
        },
        None => Ok(None),
    }
}

/// Number of canonical documents.
pub fn document_count(conn: &Connection) -> CollateResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}
