//! A scored unit competing for the selection budget.

use super::CloudId;

/// One eligible unit of one cloud, with everything ranking and diversity
/// weighting need to know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCandidate {
    pub cloud_id: CloudId,
    /// Voxel index or superpoint id, depending on granularity.
    pub unit: u32,
    /// Raw criterion score. Never NaN for an eligible unit.
    pub score: f32,
    /// Number of still unlabeled voxels the unit would label.
    pub voxel_count: u32,
    /// Mean position of the unit's voxels.
    pub centroid: [f32; 3],
    /// Most likely class of the unit's mean prediction, if predictions exist.
    pub dominant_class: Option<u32>,
}
