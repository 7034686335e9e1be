//! Per-path staleness cache: the (size, mtime) a file had when it was
//! last hashed, and the hash it produced. Lets re-runs skip hashing
//! files that have not changed on disk.

use rusqlite::{params, Connection, OptionalExtension};

use collate_core::errors::CollateResult;
use collate_core::types::{ExactHash, Fingerprint, ScannedDocument};

use crate::{to_storage_err, to_txn_err};

use super::parse_timestamp;

/// Record the metadata observed when one file was hashed.
pub fn upsert_metadata(conn: &Connection, fingerprint: &Fingerprint) -> CollateResult<()> {
    let doc = &fingerprint.document;
    conn.execute(
        "INSERT OR REPLACE INTO file_metadata (path, size_bytes, modified_at, exact_hash)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            fingerprint.path_str(),
            doc.size_bytes,
            doc.modified_at.map(|t| t.to_rfc3339()),
            fingerprint.exact_hash.as_str(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Record a whole batch in one transaction.
pub fn upsert_metadata_batch(conn: &Connection, fingerprints: &[Fingerprint]) -> CollateResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_txn_err(format!("upsert_metadata begin: {e}")))?;

    match fingerprints.iter().try_for_each(|fp| upsert_metadata(&tx, fp)) {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_txn_err(format!("upsert_metadata commit: {e}")))?;
            Ok(fingerprints.len())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// The cached hash for a walked file, or None when the cache entry is
/// missing or stale. Fresh means size and mtime both match; a file
/// without an mtime is always rehashed.
pub fn fresh_hash(conn: &Connection, document: &ScannedDocument) -> CollateResult<Option<ExactHash>> {
    let row = conn
        .query_row(
            "SELECT size_bytes, modified_at, exact_hash FROM file_metadata WHERE path = ?1",
            params![document.path.to_string_lossy()],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let Some((size, stored_mtime, hash)) = row else {
        return Ok(None);
    };
    if size != document.size_bytes {
        return Ok(None);
    }
    let stored_mtime = match stored_mtime {
        Some(raw) => Some(parse_timestamp(&raw, "modified_at")?),
        None => None,
    };
    match (stored_mtime, document.modified_at) {
        (Some(stored), Some(current)) if stored == current => Ok(Some(ExactHash::new(hash))),
        _ => Ok(None),
    }
}

/// Number of cached metadata rows.
pub fn metadata_count(conn: &Connection) -> CollateResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM file_metadata", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}
