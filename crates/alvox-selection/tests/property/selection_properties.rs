use alvox_cloud::{Cloud, LabeledUnits, SuperpointCloud};
use alvox_core::{CloudId, Criterion};
use alvox_selection::ranking::budget;
use alvox_selection::{SelectorSettings, SuperpointSelector, VoxelSelector};
use ndarray::Array2;
use proptest::prelude::*;
use test_fixtures::{InMemoryDataset, RampModel};

fn clouds(masks: &[Vec<bool>]) -> Vec<Cloud> {
    masks
        .iter()
        .enumerate()
        .map(|(i, mask)| {
            let n = mask.len();
            let points = Array2::from_shape_fn((n, 3), |(r, c)| if c == 0 { r as f32 } else { 0.0 });
            Cloud::from_parts("prop", CloudId(i as u32), points, mask.clone()).unwrap()
        })
        .collect()
}

fn masks_strategy() -> impl Strategy<Value = Vec<Vec<bool>>> {
    prop::collection::vec(prop::collection::vec(any::<bool>(), 0..24), 1..4)
}

fn criterion_strategy() -> impl Strategy<Value = Criterion> {
    prop::sample::select(Criterion::ALL.to_vec())
}

// ── Selection size and eligibility ───────────────────────────────────────

proptest! {
    #[test]
    fn selection_takes_the_budget_from_unlabeled_voxels(
        masks in masks_strategy(),
        criterion in criterion_strategy(),
        percentage in 0.0f64..=100.0,
        seed in any::<u64>(),
    ) {
        let sizes: Vec<usize> = masks.iter().map(Vec::len).collect();
        let dataset = InMemoryDataset::new(Vec::new(), &sizes);
        let settings = SelectorSettings::default().with_criterion(criterion).with_seed(seed);
        let mut selector = VoxelSelector::new(clouds(&masks), settings);

        let eligible: usize = masks.iter().flatten().filter(|l| !**l).count();
        let outcome = selector.select(&dataset, Some(&RampModel), percentage).unwrap();

        prop_assert_eq!(outcome.eligible_units, eligible);
        prop_assert_eq!(outcome.selection.total_units(), budget(eligible, percentage));
        for (cloud_id, indices) in outcome.selection.iter() {
            for &i in indices {
                prop_assert!(!masks[cloud_id.index()][i as usize]);
            }
        }
    }

    #[test]
    fn superpoint_selection_expands_only_unlabeled_members(
        entries in prop::collection::vec((0u32..6, any::<bool>()), 1..40),
        percentage in 0.0f64..=100.0,
        seed in any::<u64>(),
    ) {
        let (map, mask): (Vec<u32>, Vec<bool>) = entries.into_iter().unzip();
        let cloud = SuperpointCloud::new(clouds(&[mask.clone()]).remove(0), map.clone()).unwrap();
        let mut eligible: Vec<u32> = map
            .iter()
            .zip(&mask)
            .filter(|(_, labeled)| !**labeled)
            .map(|(&sp, _)| sp)
            .collect();
        eligible.sort_unstable();
        eligible.dedup();

        let dataset = InMemoryDataset::new(Vec::new(), &[map.len()]);
        let mut selector = SuperpointSelector::new(
            vec![cloud],
            SelectorSettings::default().with_seed(seed),
        );
        let outcome = selector.select(&dataset, None, percentage).unwrap();

        prop_assert_eq!(outcome.eligible_units, eligible.len());
        prop_assert_eq!(outcome.selected_units, budget(eligible.len(), percentage));
        let chosen = outcome.selection.get(CloudId(0)).unwrap_or(&[]);
        for &v in chosen {
            prop_assert!(!mask[v as usize]);
        }
        // Every unlabeled member of a chosen superpoint comes along.
        for (v, (&sp, &labeled)) in map.iter().zip(&mask).enumerate() {
            let sp_chosen = chosen.iter().any(|&c| map[c as usize] == sp);
            if sp_chosen && !labeled {
                prop_assert!(chosen.contains(&(v as u32)));
            }
        }
    }
}

// ── Merging is monotone and idempotent ───────────────────────────────────

proptest! {
    #[test]
    fn merge_grows_masks_and_replay_is_a_no_op(
        masks in masks_strategy(),
        percentage in 0.0f64..=100.0,
        seed in any::<u64>(),
    ) {
        let sizes: Vec<usize> = masks.iter().map(Vec::len).collect();
        let mut dataset = InMemoryDataset::new(vec![Default::default(); masks.len()], &sizes);
        let mut selector = VoxelSelector::new(
            clouds(&masks),
            SelectorSettings::default().with_seed(seed),
        );

        let outcome = selector.select(&dataset, None, percentage).unwrap();
        let before: Vec<Vec<bool>> = selector.masks().into_iter().map(|r| r.mask).collect();
        let first = selector.load_voxel_selection(&outcome.selection, &mut dataset);
        prop_assert!(first.is_clean());
        prop_assert_eq!(first.newly_labeled, outcome.selection.total_units());

        let after: Vec<Vec<bool>> = selector.masks().into_iter().map(|r| r.mask).collect();
        for (b, a) in before.iter().flatten().zip(after.iter().flatten()) {
            prop_assert!(!*b || *a);
        }

        let replay = selector.load_voxel_selection(&outcome.selection, &mut dataset);
        prop_assert_eq!(replay.newly_labeled, 0);
        let again: Vec<Vec<bool>> = selector.masks().into_iter().map(|r| r.mask).collect();
        prop_assert_eq!(again, after);
        for cloud in selector.clouds() {
            if outcome.selection.get(cloud.id()).is_some() {
                prop_assert_eq!(dataset.mask(cloud.id()), Some(cloud.label_mask()));
            }
        }
    }
}
