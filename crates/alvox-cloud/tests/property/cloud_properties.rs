use alvox_cloud::superpoint::average_by_superpoint;
use alvox_cloud::{Cloud, LabeledUnits, SuperpointAggregate, SuperpointCloud};
use alvox_core::CloudId;
use ndarray::Array2;
use proptest::prelude::*;

fn cloud(mask: Vec<bool>) -> Cloud {
    let n = mask.len();
    Cloud::from_parts("prop", CloudId(0), Array2::zeros((n, 3)), mask).unwrap()
}

// ── Label mask never loses a labeled unit ────────────────────────────────

proptest! {
    #[test]
    fn update_is_a_superset_of_the_previous_mask(
        mask in prop::collection::vec(any::<bool>(), 1..64),
        picks in prop::collection::vec(0u32..80, 0..32),
    ) {
        let mut c = cloud(mask.clone());
        let before = c.label_mask().to_vec();
        let result = c.update_label_mask(&picks);
        let after = c.label_mask();

        for (b, a) in before.iter().zip(after) {
            prop_assert!(!*b || *a);
        }
        match result {
            Ok(_) => {
                for &p in &picks {
                    prop_assert!(after[p as usize]);
                }
            }
            // Any out-of-range index rejects the whole call.
            Err(_) => prop_assert_eq!(after, before.as_slice()),
        }
    }

    #[test]
    fn applying_the_same_indices_twice_is_a_no_op(
        mask in prop::collection::vec(any::<bool>(), 1..64),
        picks in prop::collection::vec(0u32..64, 0..32),
    ) {
        let n = mask.len() as u32;
        let picks: Vec<u32> = picks.into_iter().filter(|p| *p < n).collect();
        let mut c = cloud(mask);
        c.update_label_mask(&picks).unwrap();
        let once = c.label_mask().to_vec();
        prop_assert_eq!(c.update_label_mask(&picks).unwrap(), 0);
        prop_assert_eq!(c.label_mask(), once.as_slice());
    }
}

// ── Grouped reduction matches the per-superpoint scan ────────────────────

proptest! {
    #[test]
    fn grouped_average_matches_naive_scan(
        entries in prop::collection::vec((0u32..8, prop::option::of(-10.0f32..10.0)), 1..80),
    ) {
        let map: Vec<u32> = entries.iter().map(|(sp, _)| *sp).collect();
        let values: Vec<f32> = entries.iter().map(|(_, v)| v.unwrap_or(f32::NAN)).collect();
        let k = *map.iter().max().unwrap() as usize + 1;
        let out = average_by_superpoint(&map, &values, k);

        for sp in 0..k as u32 {
            let members: Vec<f32> = map.iter().zip(&values)
                .filter(|(m, _)| **m == sp).map(|(_, v)| *v).collect();
            let valid: Vec<f32> = members.iter().copied().filter(|v| !v.is_nan()).collect();
            prop_assert_eq!(out.sizes[sp as usize], members.len() as u64);
            if valid.is_empty() {
                prop_assert!(out.averages[sp as usize].is_nan());
            } else {
                let mean = valid.iter().map(|v| *v as f64).sum::<f64>() / valid.len() as f64;
                prop_assert!((out.averages[sp as usize] as f64 - mean).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn return_values_arrays_have_equal_length(
        entries in prop::collection::vec((0u32..6, prop::option::of(0.0f32..1.0)), 1..40),
    ) {
        let map: Vec<u32> = entries.iter().map(|(sp, _)| *sp).collect();
        let values: Vec<f32> = entries.iter().map(|(_, v)| v.unwrap_or(f32::NAN)).collect();
        let sp = SuperpointCloud::new(cloud(vec![false; map.len()]), map).unwrap();
        let out = sp.return_values(&values).unwrap();
        prop_assert_eq!(out.values.len(), out.superpoint_ids.len());
        prop_assert_eq!(out.values.len(), out.sizes.len());
        prop_assert_eq!(out.values.len(), out.cloud_ids.len());
        prop_assert!(out.values.iter().all(|v| !v.is_nan()));
    }
}
