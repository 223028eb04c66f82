//! Persisted label masks and selection history.

use std::collections::BTreeMap;

use crate::errors::StorageError;
use crate::types::{CloudId, Criterion, Granularity, Selection};

/// The persisted mask of one cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudMaskRecord {
    pub cloud_id: CloudId,
    pub path: String,
    pub mask: Vec<bool>,
}

/// Everything one selection round writes. Persisted atomically.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub round: u32,
    pub criterion: Criterion,
    pub granularity: Granularity,
    pub percentage: f64,
    pub selection: Selection,
    /// Masks after the selection was merged.
    pub masks: Vec<CloudMaskRecord>,
    pub labeled_ratio: f64,
    /// Metric statistics by kind (`unweighted`, `weighted`), as JSON.
    pub metric_statistics: BTreeMap<String, serde_json::Value>,
}

/// Durable storage for label masks, addressable by cloud id.
pub trait MaskStore {
    /// All persisted masks, ordered by cloud id.
    fn load_masks(&self) -> Result<Vec<CloudMaskRecord>, StorageError>;

    /// The most recent recorded round, if any.
    fn latest_round(&self) -> Result<Option<u32>, StorageError>;

    /// Write a round's selection, masks and statistics in one transaction.
    fn record_round(&self, record: &RoundRecord) -> Result<(), StorageError>;

    /// The selection recorded for `round`.
    fn load_selection(&self, round: u32) -> Result<Option<Selection>, StorageError>;
}
