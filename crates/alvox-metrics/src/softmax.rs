//! Row-wise softmax.

use ndarray::{Array2, ArrayView2, ArrayViewMut1, Axis};

/// Softmax of every row, shifted by the row maximum so large logits do
/// not overflow. Rows with a non-finite entry become all NaN.
pub fn softmax_rows(logits: ArrayView2<'_, f32>) -> Array2<f32> {
    let mut out = logits.to_owned();
    softmax_in_place(&mut out);
    out
}

pub fn softmax_in_place(values: &mut Array2<f32>) {
    for row in values.axis_iter_mut(Axis(0)) {
        softmax_row(row);
    }
}

fn softmax_row(mut row: ArrayViewMut1<'_, f32>) {
    if row.iter().any(|v| !v.is_finite()) {
        row.fill(f32::NAN);
        return;
    }
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0f32;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        row.mapv_inplace(|v| v / sum);
    }
}
