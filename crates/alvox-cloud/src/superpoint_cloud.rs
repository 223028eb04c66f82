//! A cloud partitioned into superpoints.

use std::fmt;
use std::path::Path;

use alvox_core::errors::{InvariantViolation, LoadError, MaskError};
use alvox_core::{CloudId, Granularity, UnitCandidate};
use ndarray::{Array1, Array2};

use crate::cloud::{argmax, Cloud};
use crate::document::CloudDocument;
use crate::superpoint::SuperpointIndex;
use crate::units::{LabeledUnits, Selectable, SuperpointAggregate};

/// A `Cloud` plus the superpoint id of every voxel.
#[derive(Debug, Clone)]
pub struct SuperpointCloud {
    cloud: Cloud,
    superpoint_map: Vec<u32>,
    index: SuperpointIndex,
}

impl SuperpointCloud {
    /// Load a cloud document that carries a `superpoint_map`.
    pub fn load(path: &Path, id: CloudId) -> Result<Self, LoadError> {
        let mut document = CloudDocument::read(path)?;
        let superpoint_map = document
            .superpoint_map
            .take()
            .ok_or_else(|| LoadError::MissingArray {
                path: path.to_path_buf(),
                array: "superpoint_map",
            })?;
        let cloud = Cloud::from_document(path, id, document)?;
        Self::new(cloud, superpoint_map)
    }

    pub fn new(cloud: Cloud, superpoint_map: Vec<u32>) -> Result<Self, LoadError> {
        if superpoint_map.len() != cloud.size() {
            return Err(LoadError::SizeMismatch {
                path: cloud.path().to_path_buf(),
                array: "superpoint_map",
                expected: cloud.size(),
                actual: superpoint_map.len(),
            });
        }
        let num_superpoints = superpoint_map.iter().max().map_or(0, |&m| m as usize + 1);
        let index = SuperpointIndex::build(&superpoint_map, num_superpoints);
        Ok(Self {
            cloud,
            superpoint_map,
            index,
        })
    }

    pub fn cloud(&self) -> &Cloud {
        &self.cloud
    }

    pub fn cloud_mut(&mut self) -> &mut Cloud {
        &mut self.cloud
    }

    pub fn members(&self, superpoint: u32) -> &[u32] {
        self.index.members(superpoint)
    }

    fn unlabeled_members(&self, superpoint: u32) -> impl Iterator<Item = u32> + '_ {
        let mask = self.cloud.label_mask();
        self.members(superpoint)
            .iter()
            .copied()
            .filter(move |&v| !mask[v as usize])
    }

    fn centroid(&self, superpoint: u32) -> [f32; 3] {
        let members = self.members(superpoint);
        if members.is_empty() {
            return [f32::NAN; 3];
        }
        let points = self.cloud.points();
        let mut sum = [0f64; 3];
        for &v in members {
            let row = points.row(v as usize);
            for (acc, &x) in sum.iter_mut().zip(row.iter()) {
                *acc += f64::from(x);
            }
        }
        let n = members.len() as f64;
        [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32]
    }

    /// Argmax of the summed member predictions, skipping non-finite rows.
    fn dominant_class(&self, superpoint: u32) -> Option<u32> {
        let predictions = self.cloud.predictions()?;
        let mut total = Array1::<f32>::zeros(predictions.ncols());
        let mut seen = false;
        for &v in self.members(superpoint) {
            let row = predictions.row(v as usize);
            if row.iter().all(|p| p.is_finite()) {
                total += &row;
                seen = true;
            }
        }
        if seen {
            argmax(total.view())
        } else {
            None
        }
    }

    fn candidate(&self, superpoint: u32, score: f32, voxel_count: u32) -> UnitCandidate {
        UnitCandidate {
            cloud_id: self.cloud.id(),
            unit: superpoint,
            score,
            voxel_count,
            centroid: self.centroid(superpoint),
            dominant_class: self.dominant_class(superpoint),
        }
    }
}

impl LabeledUnits for SuperpointCloud {
    fn id(&self) -> CloudId {
        self.cloud.id()
    }

    fn path(&self) -> &Path {
        self.cloud.path()
    }

    fn size(&self) -> usize {
        self.cloud.size()
    }

    fn label_mask(&self) -> &[bool] {
        self.cloud.label_mask()
    }

    fn update_label_mask(&mut self, indices: &[u32]) -> Result<usize, MaskError> {
        self.cloud.update_label_mask(indices)
    }
}

impl SuperpointAggregate for SuperpointCloud {
    fn superpoint_map(&self) -> &[u32] {
        &self.superpoint_map
    }

    fn num_superpoints(&self) -> usize {
        self.index.num_superpoints()
    }
}

impl Selectable for SuperpointCloud {
    const GRANULARITY: Granularity = Granularity::Superpoints;

    fn eligible_units(&self) -> Vec<UnitCandidate> {
        (0..self.num_superpoints() as u32)
            .filter_map(|sp| {
                let unlabeled = self.unlabeled_members(sp).count() as u32;
                (unlabeled > 0).then(|| self.candidate(sp, 0.0, unlabeled))
            })
            .collect()
    }

    fn scored_units(&self, voxel_scores: &[f32]) -> Result<Vec<UnitCandidate>, InvariantViolation> {
        if voxel_scores.len() != self.size() {
            return Err(InvariantViolation::LengthMismatch {
                cloud_id: self.id(),
                what: "voxel_scores",
                expected: self.size(),
                actual: voxel_scores.len(),
            });
        }
        // Labeled voxels must not pull a superpoint's score.
        let masked: Vec<f32> = voxel_scores
            .iter()
            .zip(self.label_mask())
            .map(|(&s, &labeled)| if labeled || !s.is_finite() { f32::NAN } else { s })
            .collect();

        let values = self.return_values(&masked)?;
        Ok(values
            .superpoint_ids
            .iter()
            .zip(&values.values)
            .map(|(&sp, &score)| {
                let unlabeled = self.unlabeled_members(sp).count() as u32;
                self.candidate(sp, score, unlabeled)
            })
            .collect())
    }

    fn unit_voxels(&self, unit: u32) -> Vec<u32> {
        self.unlabeled_members(unit).collect()
    }

    fn unit_count(&self) -> usize {
        self.num_superpoints()
    }

    fn base(&self) -> &Cloud {
        &self.cloud
    }

    fn set_predictions(&mut self, predictions: Array2<f32>) -> Result<(), InvariantViolation> {
        self.cloud.set_predictions(predictions)
    }

    fn clear_predictions(&mut self) {
        self.cloud.clear_predictions()
    }
}

impl fmt::Display for SuperpointCloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SuperpointCloud {} ({})", self.id(), self.path().display())?;
        writeln!(f, "  voxels: {}", self.size())?;
        writeln!(f, "  superpoints: {}", self.num_superpoints())?;
        if self.cloud.num_classes() > 0 {
            writeln!(f, "  classes: {}", self.cloud.num_classes())?;
        }
        write!(f, "  labeled: {:.2}%", self.labeled_ratio() * 100.0)
    }
}
