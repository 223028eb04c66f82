//! Segmentation model collaborator.

use ndarray::{Array2, ArrayView2};

use crate::errors::InferenceError;

/// A trained per-point classifier.
///
/// `forward` takes a `(batch, features)` matrix and returns a
/// `(batch, classes)` matrix of logits or probabilities. Rows are independent:
/// splitting a batch must not change any row's output.
pub trait SegmentationModel {
    fn num_classes(&self) -> usize;

    fn forward(&self, features: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError>;
}

impl<M: SegmentationModel + ?Sized> SegmentationModel for Box<M> {
    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn forward(&self, features: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        (**self).forward(features)
    }
}
