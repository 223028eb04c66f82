//! Dataset collaborator.

use std::path::PathBuf;

use ndarray::Array2;

use crate::errors::LoadError;
use crate::types::CloudId;

/// One dataset item: a batch of points belonging to a single cloud.
#[derive(Debug, Clone)]
pub struct DatasetItem {
    /// `(points, features)` model input.
    pub features: Array2<f32>,
    /// Voxel index of each point within its cloud; `-1` marks points that
    /// project onto no voxel (e.g. ignored labels).
    pub voxel_map: Vec<i64>,
    pub cloud_id: CloudId,
    /// True on the last item of a cloud.
    pub end_of_cloud: bool,
}

/// The dataset the selector scores.
///
/// Items of one cloud are contiguous and the last one carries
/// `end_of_cloud`. Cloud ids are positions in `cloud_files`.
pub trait SelectionDataset {
    fn cloud_files(&self) -> &[PathBuf];

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn item(&self, index: usize) -> Result<DatasetItem, LoadError>;

    /// Receives the up-to-date mask of a cloud after a merge, so training
    /// iteration can hide unlabeled units.
    fn update_label_mask(&mut self, cloud_id: CloudId, mask: &[bool]);
}
