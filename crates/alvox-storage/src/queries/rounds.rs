//! Queries for selection rounds, their selections and statistics.

use std::collections::BTreeMap;

use alvox_core::errors::StorageError;
use alvox_core::{CloudId, Selection};
use rusqlite::{params, Connection, OptionalExtension};

use crate::codec::{decode_indices, encode_indices};

/// One row of the selection_rounds table.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRow {
    pub round: u32,
    pub criterion: String,
    pub granularity: String,
    pub percentage: f64,
    pub selected_units: u64,
    pub labeled_ratio: f64,
    pub created_at: i64,
}

pub fn insert_round(
    conn: &Connection,
    round: u32,
    criterion: &str,
    granularity: &str,
    percentage: f64,
    selected_units: u64,
    labeled_ratio: f64,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO selection_rounds
            (round, criterion, granularity, percentage, selected_units, labeled_ratio)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            round,
            criterion,
            granularity,
            percentage,
            selected_units as i64,
            labeled_ratio
        ],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

pub fn insert_selection(
    conn: &Connection,
    round: u32,
    cloud_id: CloudId,
    indices: &[u32],
) -> Result<(), StorageError> {
    conn.prepare_cached(
        "INSERT INTO round_selections (round, cloud_id, unit_count, indices)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            round,
            cloud_id.0,
            indices.len() as i64,
            encode_indices(indices)
        ])
    })
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

pub fn insert_statistics(
    conn: &Connection,
    round: u32,
    kind: &str,
    payload: &serde_json::Value,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO metric_statistics (round, kind, payload) VALUES (?1, ?2, ?3)",
        params![round, kind, payload.to_string()],
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

pub fn latest_round(conn: &Connection) -> Result<Option<u32>, StorageError> {
    conn.query_row("SELECT MAX(round) FROM selection_rounds", [], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

pub fn get_round(conn: &Connection, round: u32) -> Result<Option<RoundRow>, StorageError> {
    conn.query_row(
        "SELECT round, criterion, granularity, percentage, selected_units, labeled_ratio, created_at
         FROM selection_rounds WHERE round = ?1",
        params![round],
        round_row,
    )
    .optional()
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Every recorded round, oldest first.
pub fn list_rounds(conn: &Connection) -> Result<Vec<RoundRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT round, criterion, granularity, percentage, selected_units, labeled_ratio, created_at
             FROM selection_rounds ORDER BY round",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map([], round_row)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// The selection of `round`, or `None` when the round was never recorded.
pub fn load_selection(conn: &Connection, round: u32) -> Result<Option<Selection>, StorageError> {
    if get_round(conn, round)?.is_none() {
        return Ok(None);
    }
    let mut stmt = conn
        .prepare_cached(
            "SELECT cloud_id, unit_count, indices FROM round_selections
             WHERE round = ?1 ORDER BY cloud_id",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![round], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Vec<u8>>(2)?,
            ))
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut selection = Selection::new();
    for row in rows {
        let (cloud_id, unit_count, blob) =
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        let indices = decode_indices(&blob)?;
        if indices.len() as i64 != unit_count {
            return Err(StorageError::CorruptRecord {
                details: format!(
                    "round {round}, cloud {cloud_id}: {} indices stored, {unit_count} expected",
                    indices.len()
                ),
            });
        }
        selection.insert(CloudId(cloud_id), indices);
    }
    Ok(Some(selection))
}

/// Every round in which `cloud_id` received a selection.
pub fn rounds_for_cloud(conn: &Connection, cloud_id: CloudId) -> Result<Vec<u32>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT round FROM round_selections WHERE cloud_id = ?1 ORDER BY round")
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![cloud_id.0], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    rows.collect::<Result<Vec<u32>, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

/// Statistics of `round` by kind.
pub fn load_statistics(
    conn: &Connection,
    round: u32,
) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT kind, payload FROM metric_statistics WHERE round = ?1")
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map(params![round], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut out = BTreeMap::new();
    for row in rows {
        let (kind, payload) =
            row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        let value = serde_json::from_str(&payload).map_err(|e| StorageError::CorruptRecord {
            details: format!("round {round}, statistics `{kind}`: {e}"),
        })?;
        out.insert(kind, value);
    }
    Ok(out)
}

fn round_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RoundRow> {
    Ok(RoundRow {
        round: row.get(0)?,
        criterion: row.get(1)?,
        granularity: row.get(2)?,
        percentage: row.get(3)?,
        selected_units: row.get::<_, i64>(4)? as u64,
        labeled_ratio: row.get(5)?,
        created_at: row.get(6)?,
    })
}
