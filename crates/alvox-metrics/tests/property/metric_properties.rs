use alvox_core::CloudId;
use alvox_metrics::{entropy, least_confidence, margin, softmax_rows, PredictionAccumulator};
use ndarray::Array2;
use proptest::prelude::*;

fn logits(rows: usize, classes: usize) -> impl Strategy<Value = Array2<f32>> {
    prop::collection::vec(-20.0f32..20.0, rows * classes)
        .prop_map(move |v| Array2::from_shape_vec((rows, classes), v).unwrap())
}

// ── Softmax and uncertainty ranges ───────────────────────────────────────

proptest! {
    #[test]
    fn softmax_rows_are_distributions(l in (1usize..8, 2usize..6).prop_flat_map(|(r, c)| logits(r, c))) {
        let p = softmax_rows(l.view());
        for row in p.rows() {
            prop_assert!((row.sum() - 1.0).abs() < 1e-4);
            prop_assert!(row.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn uncertainty_measures_stay_in_range(l in (1usize..2, 2usize..8).prop_flat_map(|(r, c)| logits(r, c))) {
        let p = softmax_rows(l.view());
        let row = p.row(0);
        let k = row.len() as f32;
        let h = entropy(row);
        prop_assert!(h >= -1e-5 && h <= k.ln() + 1e-4);
        let m = margin(row);
        prop_assert!((-1e-6..=1.0 + 1e-6).contains(&m));
        let lc = least_confidence(row);
        prop_assert!(lc >= -1e-6 && lc <= 1.0 - 1.0 / k + 1e-5);
    }
}

// ── Projection does not depend on batching ───────────────────────────────

proptest! {
    #[test]
    fn batch_split_gives_same_means(
        points in prop::collection::vec((-1i64..6, 0.0f32..1.0), 1..60),
        split in 0usize..60,
    ) {
        let voxel_map: Vec<i64> = points.iter().map(|(v, _)| *v).collect();
        let probs = Array2::from_shape_fn((points.len(), 2), |(i, j)| {
            if j == 0 { points[i].1 } else { 1.0 - points[i].1 }
        });
        let split = split.min(points.len());

        let mut whole = PredictionAccumulator::new(CloudId(0), 6, 2);
        whole.add(&voxel_map, probs.view()).unwrap();

        let mut parts = PredictionAccumulator::new(CloudId(0), 6, 2);
        parts.add(&voxel_map[..split], probs.slice(ndarray::s![..split, ..])).unwrap();
        parts.add(&voxel_map[split..], probs.slice(ndarray::s![split.., ..])).unwrap();

        let a = whole.finalize();
        let b = parts.finalize();
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert!((x.is_nan() && y.is_nan()) || (x - y).abs() < 1e-6);
        }
    }
}
