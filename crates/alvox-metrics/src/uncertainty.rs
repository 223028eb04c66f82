//! Uncertainty measures over one class-probability row.
//!
//! All functions return NaN for a row with a non-finite entry or no
//! classes, so an unobserved voxel never outranks an observed one.

use alvox_core::Criterion;
use ndarray::ArrayView1;

/// Shannon entropy `-sum(p ln p)`, natural log. Zero probabilities add 0.
pub fn entropy(p: ArrayView1<'_, f32>) -> f32 {
    if !is_valid(p) {
        return f32::NAN;
    }
    -p.iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| v * v.ln())
        .sum::<f32>()
}

/// Gap between the two largest probabilities. A single class has margin 1.
pub fn margin(p: ArrayView1<'_, f32>) -> f32 {
    if !is_valid(p) {
        return f32::NAN;
    }
    let (first, second) = top_two(p);
    first - second.unwrap_or(0.0)
}

/// `1 - max(p)`.
pub fn least_confidence(p: ArrayView1<'_, f32>) -> f32 {
    if !is_valid(p) {
        return f32::NAN;
    }
    1.0 - top_two(p).0
}

/// Ranking score for `criterion`: higher means more informative.
/// `None` for criteria that do not look at predictions.
pub fn criterion_score(criterion: Criterion, p: ArrayView1<'_, f32>) -> Option<f32> {
    match criterion {
        Criterion::Random => None,
        Criterion::EntropyUncertainty => Some(entropy(p)),
        Criterion::MarginUncertainty => Some(1.0 - margin(p)),
        Criterion::LeastConfidence => Some(least_confidence(p)),
    }
}

fn is_valid(p: ArrayView1<'_, f32>) -> bool {
    !p.is_empty() && p.iter().all(|v| v.is_finite())
}

fn top_two(p: ArrayView1<'_, f32>) -> (f32, Option<f32>) {
    let mut first = f32::NEG_INFINITY;
    let mut second: Option<f32> = None;
    for &v in p {
        if v > first {
            if first.is_finite() {
                second = Some(first);
            }
            first = v;
        } else if second.map_or(true, |s| v > s) {
            second = Some(v);
        }
    }
    (first, second)
}
