//! `MaskStore` backed by SQLite.

use std::collections::BTreeMap;
use std::path::Path;

use alvox_core::errors::StorageError;
use alvox_core::traits::{CloudMaskRecord, MaskStore, RoundRecord};
use alvox_core::{CloudId, Selection};
use rusqlite::Connection;

use crate::connection::writer::with_immediate_transaction;
use crate::connection::DatabaseManager;
use crate::queries::rounds::RoundRow;
use crate::queries::{masks, rounds};

pub struct SqliteMaskStore {
    db: DatabaseManager,
}

impl SqliteMaskStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }

    pub fn mask(&self, cloud_id: CloudId) -> Result<Option<CloudMaskRecord>, StorageError> {
        self.db.with_conn(|conn| masks::get_mask(conn, cloud_id))
    }

    /// Store initial masks outside of any round. Existing masks may only grow.
    pub fn seed_masks(&self, records: &[CloudMaskRecord]) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            with_immediate_transaction(conn, |tx| {
                for record in records {
                    check_no_regression(tx, record)?;
                    masks::upsert_mask(tx, record, None)?;
                }
                Ok(())
            })
        })
    }

    pub fn rounds(&self) -> Result<Vec<RoundRow>, StorageError> {
        self.db.with_conn(rounds::list_rounds)
    }

    pub fn statistics(&self, round: u32) -> Result<BTreeMap<String, serde_json::Value>, StorageError> {
        self.db.with_conn(|conn| rounds::load_statistics(conn, round))
    }

    pub fn rounds_for_cloud(&self, cloud_id: CloudId) -> Result<Vec<u32>, StorageError> {
        self.db.with_conn(|conn| rounds::rounds_for_cloud(conn, cloud_id))
    }

    /// `(total, labeled)` units over every stored cloud.
    pub fn label_totals(&self) -> Result<(u64, u64), StorageError> {
        self.db.with_conn(masks::label_totals)
    }
}

impl MaskStore for SqliteMaskStore {
    fn load_masks(&self) -> Result<Vec<CloudMaskRecord>, StorageError> {
        self.db.with_conn(masks::load_all)
    }

    fn latest_round(&self) -> Result<Option<u32>, StorageError> {
        self.db.with_conn(rounds::latest_round)
    }

    fn record_round(&self, record: &RoundRecord) -> Result<(), StorageError> {
        self.db.with_conn(|conn| {
            with_immediate_transaction(conn, |tx| {
                rounds::insert_round(
                    tx,
                    record.round,
                    record.criterion.as_str(),
                    record.granularity.as_str(),
                    record.percentage,
                    record.selection.total_units() as u64,
                    record.labeled_ratio,
                )?;
                for (cloud_id, indices) in record.selection.iter() {
                    rounds::insert_selection(tx, record.round, cloud_id, indices)?;
                }
                for mask in &record.masks {
                    check_no_regression(tx, mask)?;
                    masks::upsert_mask(tx, mask, Some(record.round))?;
                }
                for (kind, payload) in &record.metric_statistics {
                    rounds::insert_statistics(tx, record.round, kind, payload)?;
                }
                Ok(())
            })
        })?;

        tracing::debug!(
            round = record.round,
            clouds = record.masks.len(),
            selected_units = record.selection.total_units(),
            "recorded selection round"
        );
        Ok(())
    }

    fn load_selection(&self, round: u32) -> Result<Option<Selection>, StorageError> {
        self.db.with_conn(|conn| rounds::load_selection(conn, round))
    }
}

/// A stored mask may only gain labels, and never changes length.
fn check_no_regression(conn: &Connection, record: &CloudMaskRecord) -> Result<(), StorageError> {
    let Some(existing) = masks::get_mask(conn, record.cloud_id)? else {
        return Ok(());
    };
    if existing.mask.len() != record.mask.len() {
        return Err(StorageError::CorruptRecord {
            details: format!(
                "cloud {}: stored mask has {} units, new mask has {}",
                record.cloud_id,
                existing.mask.len(),
                record.mask.len()
            ),
        });
    }
    let lost = existing
        .mask
        .iter()
        .zip(&record.mask)
        .filter(|(old, new)| **old && !**new)
        .count();
    if lost > 0 {
        return Err(StorageError::MaskRegression {
            cloud_id: record.cloud_id,
            lost,
        });
    }
    Ok(())
}
