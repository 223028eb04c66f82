//! Invariant violations: upstream data corruption that must stop the caller.

use super::error_code::{self, AlvoxErrorCode};
use crate::types::CloudId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Label ratio is {actual}, expected {expected} (tolerance {tolerance})")]
    LabelRatio {
        expected: f64,
        actual: f64,
        tolerance: f64,
    },

    #[error("Cloud {cloud_id}: persisted mask would unlabel {lost} units")]
    MaskRegression { cloud_id: CloudId, lost: usize },

    #[error("Cloud {cloud_id}: `{what}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        cloud_id: CloudId,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Cloud {cloud_id}: selection references already labeled unit {index}")]
    LabeledUnitSelected { cloud_id: CloudId, index: usize },
}

impl AlvoxErrorCode for InvariantViolation {
    fn error_code(&self) -> &'static str {
        error_code::INVARIANT_VIOLATION
    }
}
