//! Ranking and budget rules.

use alvox_core::constants::BUDGET_EPSILON;
use alvox_core::UnitCandidate;

/// `min(n, ceil(percentage / 100 * n))`. A relative slack of
/// `BUDGET_EPSILON` keeps exact products (20% of 15) from rounding up.
pub fn budget(n: usize, percentage: f64) -> usize {
    let raw = percentage / 100.0 * n as f64;
    let k = (raw - raw.abs() * BUDGET_EPSILON).ceil().max(0.0) as usize;
    k.min(n)
}

/// Positions of `scores` ordered by descending score. The sort is stable:
/// equal scores keep their input order. NaN scores rank last.
pub fn rank(scores: &[f32]) -> Vec<usize> {
    let key = |i: usize| {
        let s = scores[i];
        if s.is_nan() {
            f32::NEG_INFINITY
        } else {
            s
        }
    };
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
    order
}

/// Take the first `budget(n, percentage)` ranked units.
pub fn take_units(order: &[usize], percentage: f64) -> Vec<usize> {
    order[..budget(order.len(), percentage)].to_vec()
}

/// Take ranked units until their unlabeled voxels reach
/// `budget(total eligible voxels, percentage)`.
pub fn take_voxels(order: &[usize], candidates: &[UnitCandidate], percentage: f64) -> Vec<usize> {
    let total: usize = candidates.iter().map(|c| c.voxel_count as usize).sum();
    let target = budget(total, percentage);
    let mut covered = 0usize;
    let mut taken = Vec::new();
    for &i in order {
        if covered >= target {
            break;
        }
        covered += candidates[i].voxel_count as usize;
        taken.push(i);
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use alvox_core::CloudId;

    #[test]
    fn budget_uses_ceiling() {
        assert_eq!(budget(15, 20.0), 3);
        assert_eq!(budget(12, 20.0), 3);
        assert_eq!(budget(10, 1.0), 1);
        assert_eq!(budget(10, 0.0), 0);
        assert_eq!(budget(10, 100.0), 10);
        assert_eq!(budget(0, 50.0), 0);
        assert_eq!(budget(3, 34.0), 2);
    }

    #[test]
    fn rank_is_descending_and_stable() {
        assert_eq!(rank(&[0.1, 0.5, 0.5, 0.9]), vec![3, 1, 2, 0]);
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn nan_scores_rank_last() {
        let scores = [0.2, f32::NAN, 0.7, f32::NAN, 0.0];
        assert_eq!(rank(&scores), vec![2, 0, 4, 1, 3]);
        assert_eq!(take_units(&rank(&scores), 40.0), vec![2, 0]);
    }

    #[test]
    fn voxel_budget_stops_once_covered() {
        let unit = |n: u32| UnitCandidate {
            cloud_id: CloudId(0),
            unit: 0,
            score: 0.0,
            voxel_count: n,
            centroid: [0.0; 3],
            dominant_class: None,
        };
        let candidates = vec![unit(4), unit(1), unit(5)];
        // 10 voxels, 30% => 3: the first unit alone covers it.
        assert_eq!(take_voxels(&[0, 1, 2], &candidates, 30.0), vec![0]);
        assert_eq!(take_voxels(&[1, 0, 2], &candidates, 30.0), vec![1, 0]);
        assert!(take_voxels(&[0, 1, 2], &candidates, 0.0).is_empty());
    }
}
