//! Label mask merge errors.

use super::error_code::{self, AlvoxErrorCode};
use crate::types::CloudId;

/// Errors raised when merging unit indices into a cloud's label mask.
/// A failing cloud is left untouched; other clouds are unaffected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaskError {
    #[error("Cloud {cloud_id}: unit index {index} is outside [0, {size})")]
    IndexOutOfRange {
        cloud_id: CloudId,
        index: usize,
        size: usize,
    },

    #[error("Cloud {cloud_id} is not part of this selector")]
    UnknownCloud { cloud_id: CloudId },

    #[error("Cloud {cloud_id}: mask has {actual} entries, expected {expected}")]
    SizeMismatch {
        cloud_id: CloudId,
        expected: usize,
        actual: usize,
    },
}

impl MaskError {
    pub fn cloud_id(&self) -> CloudId {
        match self {
            Self::IndexOutOfRange { cloud_id, .. }
            | Self::UnknownCloud { cloud_id }
            | Self::SizeMismatch { cloud_id, .. } => *cloud_id,
        }
    }
}

impl AlvoxErrorCode for MaskError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCloud { .. } => error_code::UNKNOWN_CLOUD,
            _ => error_code::INDEX_ERROR,
        }
    }
}
