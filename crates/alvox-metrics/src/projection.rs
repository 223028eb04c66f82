//! Projection of per-point predictions onto the voxels of one cloud.

use alvox_core::constants::IGNORED_VOXEL;
use alvox_core::errors::InferenceError;
use alvox_core::{CloudId, Criterion};
use ndarray::{Array2, ArrayView2, Axis};

use crate::uncertainty::criterion_score;

/// Running per-voxel sums of class probabilities for one cloud.
///
/// Points may arrive in any number of batches. Finalizing yields the mean
/// probability vector of every observed voxel.
#[derive(Debug, Clone)]
pub struct PredictionAccumulator {
    cloud_id: CloudId,
    sums: Array2<f64>,
    counts: Vec<u32>,
}

impl PredictionAccumulator {
    pub fn new(cloud_id: CloudId, num_voxels: usize, num_classes: usize) -> Self {
        Self {
            cloud_id,
            sums: Array2::zeros((num_voxels, num_classes)),
            counts: vec![0; num_voxels],
        }
    }

    pub fn cloud_id(&self) -> CloudId {
        self.cloud_id
    }

    pub fn num_voxels(&self) -> usize {
        self.counts.len()
    }

    pub fn num_classes(&self) -> usize {
        self.sums.ncols()
    }

    /// Add one batch. Row `i` of `probabilities` belongs to voxel
    /// `voxel_map[i]`; points mapped to -1 are skipped.
    ///
    /// The batch is validated before anything is accumulated.
    pub fn add(
        &mut self,
        voxel_map: &[i64],
        probabilities: ArrayView2<'_, f32>,
    ) -> Result<(), InferenceError> {
        if voxel_map.len() != probabilities.nrows() {
            return Err(InferenceError::VoxelMapMismatch {
                cloud_id: self.cloud_id,
                expected: probabilities.nrows(),
                actual: voxel_map.len(),
            });
        }
        if probabilities.ncols() != self.num_classes() {
            return Err(InferenceError::ClassMismatch {
                expected: self.num_classes(),
                actual: probabilities.ncols(),
            });
        }
        let size = self.num_voxels();
        if let Some(&bad) = voxel_map
            .iter()
            .find(|&&v| v != IGNORED_VOXEL && (v < 0 || v as usize >= size))
        {
            return Err(InferenceError::VoxelOutOfRange {
                cloud_id: self.cloud_id,
                voxel: bad,
                size,
            });
        }

        for (&voxel, row) in voxel_map.iter().zip(probabilities.axis_iter(Axis(0))) {
            if voxel == IGNORED_VOXEL || row.iter().any(|p| !p.is_finite()) {
                continue;
            }
            let v = voxel as usize;
            let mut sum = self.sums.row_mut(v);
            for (acc, &p) in sum.iter_mut().zip(row.iter()) {
                *acc += f64::from(p);
            }
            self.counts[v] += 1;
        }
        Ok(())
    }

    /// Voxels that received at least one point.
    pub fn observed_voxels(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Mean probabilities, `(num_voxels, num_classes)`. Unobserved voxels
    /// get a NaN row.
    pub fn finalize(self) -> Array2<f32> {
        let mut out = Array2::from_elem(self.sums.dim(), f32::NAN);
        for ((sum, mut row), &count) in self
            .sums
            .axis_iter(Axis(0))
            .zip(out.axis_iter_mut(Axis(0)))
            .zip(&self.counts)
        {
            if count == 0 {
                continue;
            }
            let n = f64::from(count);
            for (dst, &s) in row.iter_mut().zip(sum.iter()) {
                *dst = (s / n) as f32;
            }
        }
        out
    }
}

/// Per-voxel criterion scores from mean probabilities. Labeled voxels and
/// NaN rows score NaN. Random has no prediction-based score and yields all NaN.
pub fn voxel_scores(
    criterion: Criterion,
    mean_probabilities: ArrayView2<'_, f32>,
    label_mask: &[bool],
) -> Vec<f32> {
    mean_probabilities
        .axis_iter(Axis(0))
        .zip(label_mask)
        .map(|(row, &labeled)| {
            if labeled {
                f32::NAN
            } else {
                criterion_score(criterion, row).unwrap_or(f32::NAN)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn mean_over_points_and_batches() {
        let mut acc = PredictionAccumulator::new(CloudId(0), 3, 2);
        acc.add(&[0, 0, -1], array![[1.0f32, 0.0], [0.0, 1.0], [0.3, 0.7]].view())
            .unwrap();
        acc.add(&[2], array![[0.2f32, 0.8]].view()).unwrap();
        assert_eq!(acc.observed_voxels(), 2);

        let mean = acc.finalize();
        assert_eq!(mean.row(0).to_vec(), vec![0.5, 0.5]);
        assert!(mean.row(1).iter().all(|v| v.is_nan()));
        assert!((mean[[2, 1]] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_voxel_rejects_the_batch() {
        let mut acc = PredictionAccumulator::new(CloudId(1), 2, 2);
        let err = acc
            .add(&[0, 5], array![[0.5f32, 0.5], [0.5, 0.5]].view())
            .unwrap_err();
        assert!(matches!(err, InferenceError::VoxelOutOfRange { voxel: 5, .. }));
        assert_eq!(acc.observed_voxels(), 0);
    }

    #[test]
    fn shape_mismatches_are_errors() {
        let mut acc = PredictionAccumulator::new(CloudId(1), 2, 2);
        assert!(matches!(
            acc.add(&[0], array![[0.5f32, 0.5], [0.5, 0.5]].view()),
            Err(InferenceError::VoxelMapMismatch { .. })
        ));
        assert!(matches!(
            acc.add(&[0], array![[0.2f32, 0.3, 0.5]].view()),
            Err(InferenceError::ClassMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn labeled_and_unobserved_voxels_score_nan() {
        let mean = array![[0.5f32, 0.5], [f32::NAN, f32::NAN], [0.9, 0.1]];
        let scores = voxel_scores(Criterion::LeastConfidence, mean.view(), &[false, false, true]);
        assert!((scores[0] - 0.5).abs() < 1e-6);
        assert!(scores[1].is_nan());
        assert!(scores[2].is_nan());
    }
}
