//! Batched model inference projected onto voxels.

use std::collections::BTreeMap;
use std::time::Instant;

use alvox_core::config::ModelOutput;
use alvox_core::errors::{InferenceError, SelectionError};
use alvox_core::traits::{SegmentationModel, SelectionDataset};
use alvox_core::CloudId;
use alvox_metrics::{softmax_in_place, PredictionAccumulator};
use ndarray::{Array2, Axis};

/// Run `model` over every dataset item and return the mean class
/// probabilities of every voxel, per cloud.
///
/// `sizes` lists the clouds to project onto; items of other clouds are
/// skipped. Items are fed in slices of at most `batch_size` points, which
/// changes throughput only. Clouds without items are absent from the result.
pub fn predict_voxels(
    dataset: &dyn SelectionDataset,
    model: &dyn SegmentationModel,
    sizes: &BTreeMap<CloudId, usize>,
    batch_size: usize,
    output: ModelOutput,
) -> Result<BTreeMap<CloudId, Array2<f32>>, SelectionError> {
    let span = alvox_core::inference_span!(dataset.len(), batch_size);
    let _guard = span.enter();
    let started = Instant::now();

    let num_classes = model.num_classes();
    let batch_size = batch_size.max(1);
    let mut pending: BTreeMap<CloudId, PredictionAccumulator> = BTreeMap::new();
    let mut done: BTreeMap<CloudId, Array2<f32>> = BTreeMap::new();

    for index in 0..dataset.len() {
        let item = dataset.item(index)?;
        let Some(&size) = sizes.get(&item.cloud_id) else {
            tracing::trace!(cloud_id = %item.cloud_id, "skipping item of unloaded cloud");
            continue;
        };
        if item.voxel_map.len() != item.features.nrows() {
            return Err(InferenceError::VoxelMapMismatch {
                cloud_id: item.cloud_id,
                expected: item.features.nrows(),
                actual: item.voxel_map.len(),
            }
            .into());
        }

        let accumulator = pending
            .entry(item.cloud_id)
            .or_insert_with(|| PredictionAccumulator::new(item.cloud_id, size, num_classes));

        for (features, voxel_map) in item
            .features
            .axis_chunks_iter(Axis(0), batch_size)
            .zip(item.voxel_map.chunks(batch_size))
        {
            let mut probabilities = model.forward(features)?;
            if probabilities.nrows() != features.nrows() {
                return Err(InferenceError::RowMismatch {
                    expected: features.nrows(),
                    actual: probabilities.nrows(),
                }
                .into());
            }
            if probabilities.ncols() != num_classes {
                return Err(InferenceError::ClassMismatch {
                    expected: num_classes,
                    actual: probabilities.ncols(),
                }
                .into());
            }
            if output == ModelOutput::Logits {
                softmax_in_place(&mut probabilities);
            }
            accumulator.add(voxel_map, probabilities.view())?;
        }

        if item.end_of_cloud {
            if let Some(finished) = pending.remove(&item.cloud_id) {
                tracing::debug!(
                    cloud_id = %item.cloud_id,
                    observed = finished.observed_voxels(),
                    "cloud inference complete"
                );
                done.insert(item.cloud_id, finished.finalize());
            }
        }
    }

    // Clouds whose last item was not flagged.
    for (cloud_id, accumulator) in pending {
        done.insert(cloud_id, accumulator.finalize());
    }

    tracing::info!(
        clouds = done.len(),
        inference_time_ms = started.elapsed().as_millis() as u64,
        "inference complete"
    );
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_fixtures::{FailingModel, InMemoryDataset, RampModel, TableModel};

    fn sizes(list: &[usize]) -> BTreeMap<CloudId, usize> {
        list.iter()
            .enumerate()
            .map(|(i, &s)| (CloudId(i as u32), s))
            .collect()
    }

    #[test]
    fn batching_does_not_change_predictions() {
        let whole = InMemoryDataset::new(vec![], &[7, 3]);
        let split = InMemoryDataset::chunked(vec![], &[7, 3], 2, 2);
        let a = predict_voxels(&whole, &RampModel, &sizes(&[7, 3]), 1 << 16, ModelOutput::Logits).unwrap();
        let b = predict_voxels(&split, &RampModel, &sizes(&[7, 3]), 3, ModelOutput::Logits).unwrap();
        assert_eq!(a.len(), 2);
        for (id, probs) in &a {
            let other = &b[id];
            for (x, y) in probs.iter().zip(other.iter()) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn batch_size_bounds_forward_calls() {
        let dataset = InMemoryDataset::new(vec![], &[10]);
        let model = TableModel::new(2);
        predict_voxels(&dataset, &model, &sizes(&[10]), 4, ModelOutput::Probabilities).unwrap();
        assert_eq!(model.calls(), 3);
    }

    #[test]
    fn probabilities_pass_through_unchanged() {
        let dataset = InMemoryDataset::new(vec![], &[2]);
        let model = TableModel::new(2).with_row(0, 1, vec![0.8, 0.2]);
        let out = predict_voxels(&dataset, &model, &sizes(&[2]), 8, ModelOutput::Probabilities).unwrap();
        let probs = &out[&CloudId(0)];
        assert_eq!(probs.row(0).to_vec(), vec![0.5, 0.5]);
        assert_eq!(probs.row(1).to_vec(), vec![0.8, 0.2]);
    }

    #[test]
    fn model_failure_aborts() {
        let dataset = InMemoryDataset::new(vec![], &[2]);
        let err = predict_voxels(&dataset, &FailingModel, &sizes(&[2]), 8, ModelOutput::Logits)
            .unwrap_err();
        assert!(matches!(err, SelectionError::Inference(InferenceError::Failed { .. })));
    }

    #[test]
    fn unloaded_clouds_are_skipped() {
        let dataset = InMemoryDataset::new(vec![], &[2, 2]);
        let out = predict_voxels(&dataset, &RampModel, &sizes(&[2]), 8, ModelOutput::Logits).unwrap();
        assert!(out.contains_key(&CloudId(0)));
        assert!(!out.contains_key(&CloudId(1)));
    }
}
