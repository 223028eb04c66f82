//! Model collaborator errors.

use super::error_code::{self, AlvoxErrorCode};
use crate::types::CloudId;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Model returned {actual} rows for a batch of {expected} points")]
    RowMismatch { expected: usize, actual: usize },

    #[error("Model returned {actual} classes, expected {expected}")]
    ClassMismatch { expected: usize, actual: usize },

    #[error("Cloud {cloud_id}: voxel map has {actual} entries for {expected} points")]
    VoxelMapMismatch {
        cloud_id: CloudId,
        expected: usize,
        actual: usize,
    },

    #[error("Cloud {cloud_id}: point maps to voxel {voxel}, cloud has {size} voxels")]
    VoxelOutOfRange {
        cloud_id: CloudId,
        voxel: i64,
        size: usize,
    },

    #[error("Inference failed: {reason}")]
    Failed { reason: String },
}

impl AlvoxErrorCode for InferenceError {
    fn error_code(&self) -> &'static str {
        error_code::INFERENCE_ERROR
    }
}
