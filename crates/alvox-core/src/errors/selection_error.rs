//! Round-level errors and non-fatal per-cloud error collection.

use super::{
    AlvoxErrorCode, ConfigError, InferenceError, InvariantViolation, LoadError, MaskError,
    StorageError,
};
use crate::types::CloudId;

/// Errors that abort a selection round.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Mask error: {0}")]
    Mask(#[from] MaskError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl AlvoxErrorCode for SelectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Load(e) => e.error_code(),
            Self::Mask(e) => e.error_code(),
            Self::Inference(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Invariant(e) => e.error_code(),
        }
    }
}

/// Result of loading a set of clouds: the loaded value plus the clouds
/// that were skipped.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    pub value: T,
    pub errors: Vec<LoadError>,
}

impl<T> LoadOutcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of merging a selection into the label masks.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Clouds whose mask was merged (possibly with zero new units).
    pub merged_clouds: Vec<CloudId>,
    /// Units that changed from unlabeled to labeled.
    pub newly_labeled: usize,
    /// Clouds left untouched because their part of the selection was invalid.
    pub errors: Vec<MaskError>,
}

impl MergeOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
