//! Queries for the clouds table: the current mask of every cloud.

use alvox_core::errors::StorageError;
use alvox_core::traits::CloudMaskRecord;
use alvox_core::CloudId;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::codec::{pack_mask, unpack_mask};

/// Insert or replace the mask of one cloud.
pub fn upsert_mask(
    conn: &Connection,
    record: &CloudMaskRecord,
    round: Option<u32>,
) -> Result<(), StorageError> {
    let labeled = record.mask.iter().filter(|l| **l).count() as i64;
    conn.prepare_cached(
        "INSERT INTO clouds (cloud_id, path, size, labeled, mask, updated_round)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(cloud_id) DO UPDATE SET
            path = excluded.path,
            size = excluded.size,
            labeled = excluded.labeled,
            mask = excluded.mask,
            updated_round = excluded.updated_round,
            updated_at = unixepoch()",
    )
    .and_then(|mut stmt| {
        stmt.execute(params![
            record.cloud_id.0,
            record.path,
            record.mask.len() as i64,
            labeled,
            pack_mask(&record.mask),
            round,
        ])
    })
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(())
}

pub fn get_mask(conn: &Connection, cloud_id: CloudId) -> Result<Option<CloudMaskRecord>, StorageError> {
    let raw = conn
        .query_row(
            "SELECT cloud_id, path, size, mask FROM clouds WHERE cloud_id = ?1",
            params![cloud_id.0],
            raw_row,
        )
        .optional()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    raw.map(RawMask::decode).transpose()
}

/// All masks, ordered by cloud id.
pub fn load_all(conn: &Connection) -> Result<Vec<CloudMaskRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT cloud_id, path, size, mask FROM clouds ORDER BY cloud_id")
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let rows = stmt
        .query_map([], raw_row)
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    let mut out = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        out.push(raw.decode()?);
    }
    Ok(out)
}

/// Total and labeled unit counts over every stored cloud.
pub fn label_totals(conn: &Connection) -> Result<(u64, u64), StorageError> {
    conn.query_row(
        "SELECT COALESCE(SUM(size), 0), COALESCE(SUM(labeled), 0) FROM clouds",
        [],
        |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
    )
    .map_err(|e| StorageError::SqliteError { message: e.to_string() })
}

struct RawMask {
    cloud_id: u32,
    path: String,
    size: i64,
    mask: Vec<u8>,
}

impl RawMask {
    fn decode(self) -> Result<CloudMaskRecord, StorageError> {
        let size = usize::try_from(self.size).map_err(|_| StorageError::CorruptRecord {
            details: format!("cloud {}: negative size {}", self.cloud_id, self.size),
        })?;
        Ok(CloudMaskRecord {
            cloud_id: CloudId(self.cloud_id),
            path: self.path,
            mask: unpack_mask(&self.mask, size)?,
        })
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawMask> {
    Ok(RawMask {
        cloud_id: row.get(0)?,
        path: row.get(1)?,
        size: row.get(2)?,
        mask: row.get(3)?,
    })
}
