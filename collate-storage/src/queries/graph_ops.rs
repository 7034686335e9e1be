//! Consolidated graph edges.

use rusqlite::{params, Connection};

use collate_core::errors::CollateResult;
use collate_core::types::{ConsolidatedEdge, EdgeFlags, EntityId};

use crate::{to_storage_err, to_txn_err};

/// Upsert one consolidated edge. REPLACE: each run's consolidation is
/// authoritative for the triples it contains, so re-running a batch
/// is idempotent.
pub fn upsert_edge(conn: &Connection, edge: &ConsolidatedEdge) -> CollateResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO graph_edges (
            source_id, target_id, rel_type, weight, merged_from,
            corroborated, inferred, self_referential
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            edge.source.as_str(),
            edge.target.as_str(),
            edge.rel_type,
            edge.weight,
            edge.merged_from,
            edge.flags.corroborated as i32,
            edge.flags.inferred as i32,
            edge.flags.self_referential as i32,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Upsert a batch of edges in one transaction.
pub fn upsert_edges(conn: &Connection, edges: &[ConsolidatedEdge]) -> CollateResult<usize> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_txn_err(format!("upsert_edges begin: {e}")))?;

    match edges.iter().try_for_each(|edge| upsert_edge(&tx, edge)) {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_txn_err(format!("upsert_edges commit: {e}")))?;
            Ok(edges.len())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

/// Edges touching one entity, as source or target.
pub fn edges_of(conn: &Connection, id: &EntityId) -> CollateResult<Vec<ConsolidatedEdge>> {
    query_edges(
        conn,
        "SELECT source_id, target_id, rel_type, weight, merged_from,
                corroborated, inferred, self_referential
         FROM graph_edges
         WHERE source_id = ?1 OR target_id = ?1
         ORDER BY source_id, target_id, rel_type",
        params![id.as_str()],
    )
}

/// Every edge, ordered by (source, target, rel_type) so exports are
/// stable.
pub fn all_edges(conn: &Connection) -> CollateResult<Vec<ConsolidatedEdge>> {
    query_edges(
        conn,
        "SELECT source_id, target_id, rel_type, weight, merged_from,
                corroborated, inferred, self_referential
         FROM graph_edges
         ORDER BY source_id, target_id, rel_type",
        [],
    )
}

fn query_edges<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> CollateResult<Vec<ConsolidatedEdge>> {
    let mut stmt = conn.prepare(sql).map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map(params, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, i32>(5)?,
                row.get::<_, i32>(6)?,
                row.get::<_, i32>(7)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut edges = Vec::new();
    for row in rows {
        let (source, target, rel_type, weight, merged_from, corroborated, inferred, self_referential) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        edges.push(ConsolidatedEdge {
            source: EntityId::from_stored(source),
            target: EntityId::from_stored(target),
            rel_type,
            weight,
            merged_from,
            flags: EdgeFlags {
                corroborated: corroborated != 0,
                inferred: inferred != 0,
                self_referential: self_referential != 0,
            },
        });
    }
    Ok(edges)
}

/// Number of stored edges.
pub fn edge_count(conn: &Connection) -> CollateResult<usize> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM graph_edges", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count as usize)
}
