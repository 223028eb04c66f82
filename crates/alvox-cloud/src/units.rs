//! Capability traits shared by voxel and superpoint clouds.

use std::path::Path;

use alvox_core::constants::LABEL_RATIO_TOLERANCE;
use alvox_core::errors::{InvariantViolation, MaskError};
use alvox_core::{CloudId, Granularity, UnitCandidate};
use ndarray::Array2;

use crate::cloud::Cloud;
use crate::superpoint::{self, SuperpointAverages, SuperpointValues};

/// A collection of units with a monotone label mask.
pub trait LabeledUnits {
    fn id(&self) -> CloudId;

    fn path(&self) -> &Path;

    /// Number of voxels. Fixed after load.
    fn size(&self) -> usize;

    fn label_mask(&self) -> &[bool];

    /// Mark `indices` as labeled.
    ///
    /// Every index is checked before the mask is touched, so an
    /// out-of-range index leaves the mask unchanged. Already labeled
    /// indices are a no-op. Returns the number of newly labeled voxels.
    fn update_label_mask(&mut self, indices: &[u32]) -> Result<usize, MaskError>;

    fn labeled_count(&self) -> usize {
        self.label_mask().iter().filter(|labeled| **labeled).count()
    }

    /// Fraction of voxels labeled. An empty cloud counts as fully labeled.
    fn labeled_ratio(&self) -> f64 {
        match self.size() {
            0 => 1.0,
            size => self.labeled_count() as f64 / size as f64,
        }
    }

    fn unlabeled_indices(&self) -> Vec<u32> {
        self.label_mask()
            .iter()
            .enumerate()
            .filter(|(_, labeled)| !**labeled)
            .map(|(i, _)| i as u32)
            .collect()
    }

    fn is_fully_labeled(&self) -> bool {
        self.label_mask().iter().all(|labeled| *labeled)
    }

    /// Fails when the labeled ratio is not 1 within tolerance.
    fn ensure_fully_labeled(&self) -> Result<(), InvariantViolation> {
        let actual = self.labeled_ratio();
        if (actual - 1.0).abs() > LABEL_RATIO_TOLERANCE {
            return Err(InvariantViolation::LabelRatio {
                expected: 1.0,
                actual,
                tolerance: LABEL_RATIO_TOLERANCE,
            });
        }
        Ok(())
    }
}

/// Clouds partitioned into superpoints.
pub trait SuperpointAggregate: LabeledUnits {
    /// Superpoint id of every voxel.
    fn superpoint_map(&self) -> &[u32];

    /// `max(superpoint_map) + 1`, or 0 for an empty cloud.
    fn num_superpoints(&self) -> usize;

    /// Per-superpoint NaN-aware mean of `values` and voxel count.
    fn average_by_superpoint(
        &self,
        values: &[f32],
    ) -> Result<SuperpointAverages, InvariantViolation> {
        if values.len() != self.size() {
            return Err(InvariantViolation::LengthMismatch {
                cloud_id: self.id(),
                what: "values",
                expected: self.size(),
                actual: values.len(),
            });
        }
        Ok(superpoint::average_by_superpoint(
            self.superpoint_map(),
            values,
            self.num_superpoints(),
        ))
    }

    /// Averages with NaN superpoints dropped: the cloud's contribution to the
    /// dataset-wide ranking.
    fn return_values(&self, values: &[f32]) -> Result<SuperpointValues, InvariantViolation> {
        let averages = self.average_by_superpoint(values)?;
        Ok(SuperpointValues::from_averages(self.id(), &averages))
    }
}

/// What the ranking core needs from a cloud at its selection granularity.
pub trait Selectable: LabeledUnits + Send + Sync {
    /// The kind of unit this cloud type ranks.
    const GRANULARITY: Granularity;

    /// Every unit that still has an unlabeled voxel, with a zero score.
    /// Ordered by unit id.
    fn eligible_units(&self) -> Vec<UnitCandidate>;

    /// Units scored from per-voxel scores. Labeled voxels never contribute;
    /// units without a finite score are not eligible. Ordered by unit id.
    fn scored_units(&self, voxel_scores: &[f32]) -> Result<Vec<UnitCandidate>, InvariantViolation>;

    /// The still unlabeled voxels a selected unit expands to.
    fn unit_voxels(&self, unit: u32) -> Vec<u32>;

    /// Number of units at this granularity.
    fn unit_count(&self) -> usize;

    /// The underlying voxel cloud.
    fn base(&self) -> &Cloud;

    /// Attach per-voxel mean class probabilities. Rows must match `size`.
    fn set_predictions(&mut self, predictions: Array2<f32>) -> Result<(), InvariantViolation>;

    /// Drop attached predictions so the cloud is not model-ranked.
    fn clear_predictions(&mut self);
}
