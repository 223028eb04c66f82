//! Diversity terms and their combination with raw scores.
//!
//! A diversity term `d(u)` favors units that spread the labeling budget:
//! units of rare predicted classes (`class_balance`) or units in sparsely
//! populated regions (`inverse_density`). Terms are computed over the whole
//! eligible pool, so the same unit can weigh differently between rounds.

use alvox_core::config::{Combination, DiversitySettings, DiversityTerm};
use alvox_core::{CloudId, UnitCandidate};
use rustc_hash::FxHashMap;

/// `N / (K * n_c)` per unit, `c` its dominant class, `n_c` the pool units
/// sharing it, `K` the number of distinct classes and `N` the pool size.
/// Units without a dominant class get 1.
pub fn class_balance(units: &[UnitCandidate]) -> Vec<f64> {
    let mut per_class: FxHashMap<u32, usize> = FxHashMap::default();
    for class in units.iter().filter_map(|u| u.dominant_class) {
        *per_class.entry(class).or_insert(0) += 1;
    }
    let pool = units.len() as f64;
    let classes = per_class.len() as f64;

    units
        .iter()
        .map(|u| match u.dominant_class.and_then(|c| per_class.get(&c)) {
            Some(&n) => pool / (classes * n as f64),
            None => 1.0,
        })
        .collect()
}

/// `1 / (1 + m)` per unit, `m` the other units of the same cloud whose
/// centroid falls in the same grid cell of edge `cell_size`.
/// Units with a non-finite centroid get 1.
pub fn inverse_density(units: &[UnitCandidate], cell_size: f64) -> Vec<f64> {
    let cells: Vec<Option<GridCell>> = units
        .iter()
        .map(|u| GridCell::of(u.cloud_id, u.centroid, cell_size))
        .collect();

    let mut occupancy: FxHashMap<GridCell, u32> = FxHashMap::default();
    for cell in cells.iter().flatten() {
        *occupancy.entry(*cell).or_insert(0) += 1;
    }

    cells
        .iter()
        .map(|cell| match cell.and_then(|c| occupancy.get(&c)) {
            Some(&count) => 1.0 / f64::from(count),
            None => 1.0,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GridCell {
    cloud_id: CloudId,
    x: i64,
    y: i64,
    z: i64,
}

impl GridCell {
    fn of(cloud_id: CloudId, centroid: [f32; 3], cell_size: f64) -> Option<Self> {
        if centroid.iter().any(|c| !c.is_finite()) {
            return None;
        }
        let cell = |c: f32| (f64::from(c) / cell_size).floor() as i64;
        Some(Self {
            cloud_id,
            x: cell(centroid[0]),
            y: cell(centroid[1]),
            z: cell(centroid[2]),
        })
    }
}

/// Combine raw scores `s` with diversity terms `d`.
///
/// `Product`: `s * d^strength`. `Additive`: `(1 - strength) * norm(s) +
/// strength * norm(d)` with min-max normalization; a constant vector
/// normalizes to all zeros.
pub fn combine(scores: &[f64], terms: &[f64], combination: Combination, strength: f64) -> Vec<f64> {
    match combination {
        Combination::Product => scores
            .iter()
            .zip(terms)
            .map(|(&s, &d)| s * d.powf(strength))
            .collect(),
        Combination::Additive => {
            let s = min_max_normalize(scores);
            let d = min_max_normalize(terms);
            s.iter()
                .zip(&d)
                .map(|(&s, &d)| (1.0 - strength) * s + strength * d)
                .collect()
        }
    }
}

fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !(range > 0.0) || !range.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&v| (v - min) / range).collect()
}

/// Diversity-weighted scores of `units`, in pool order.
pub fn weighted_scores(settings: &DiversitySettings, units: &[UnitCandidate]) -> Vec<f32> {
    let terms = match settings.term {
        DiversityTerm::ClassBalance => class_balance(units),
        DiversityTerm::InverseDensity => inverse_density(units, settings.cell_size),
    };
    let scores: Vec<f64> = units.iter().map(|u| f64::from(u.score)).collect();
    combine(&scores, &terms, settings.combination, settings.strength)
        .into_iter()
        .map(|s| s as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(cloud: u32, unit: u32, score: f32, class: Option<u32>, centroid: [f32; 3]) -> UnitCandidate {
        UnitCandidate {
            cloud_id: CloudId(cloud),
            unit,
            score,
            voxel_count: 1,
            centroid,
            dominant_class: class,
        }
    }

    #[test]
    fn rare_classes_weigh_more() {
        let units = vec![
            unit(0, 0, 1.0, Some(0), [0.0; 3]),
            unit(0, 1, 1.0, Some(0), [0.0; 3]),
            unit(0, 2, 1.0, Some(0), [0.0; 3]),
            unit(0, 3, 1.0, Some(1), [0.0; 3]),
        ];
        let d = class_balance(&units);
        // N = 4, K = 2: class 0 gets 4 / 6, class 1 gets 4 / 2.
        assert!((d[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((d[3] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn units_without_class_are_neutral() {
        let units = vec![unit(0, 0, 1.0, None, [0.0; 3]), unit(0, 1, 1.0, Some(2), [0.0; 3])];
        assert_eq!(class_balance(&units), vec![1.0, 2.0]);
    }

    #[test]
    fn density_counts_same_cell_same_cloud_only() {
        let units = vec![
            unit(0, 0, 1.0, None, [0.1, 0.1, 0.1]),
            unit(0, 1, 1.0, None, [0.9, 0.2, 0.5]),
            unit(0, 2, 1.0, None, [1.5, 0.1, 0.1]),
            unit(1, 0, 1.0, None, [0.1, 0.1, 0.1]),
            unit(0, 3, 1.0, None, [f32::NAN, 0.0, 0.0]),
        ];
        assert_eq!(inverse_density(&units, 1.0), vec![0.5, 0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn negative_coordinates_floor_into_their_own_cell() {
        let units = vec![
            unit(0, 0, 1.0, None, [-0.1, 0.0, 0.0]),
            unit(0, 1, 1.0, None, [0.1, 0.0, 0.0]),
        ];
        assert_eq!(inverse_density(&units, 1.0), vec![1.0, 1.0]);
    }

    #[test]
    fn product_with_zero_strength_keeps_scores() {
        let out = combine(&[0.3, 0.7], &[5.0, 0.1], Combination::Product, 0.0);
        assert_eq!(out, vec![0.3, 0.7]);
        let out = combine(&[0.3, 0.7], &[2.0, 0.5], Combination::Product, 1.0);
        assert_eq!(out, vec![0.6, 0.35]);
    }

    #[test]
    fn additive_normalizes_both_sides() {
        let out = combine(&[1.0, 3.0], &[10.0, 0.0], Combination::Additive, 0.5);
        assert_eq!(out, vec![0.5, 0.5]);
        let out = combine(&[2.0, 2.0], &[1.0, 1.0], Combination::Additive, 0.5);
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn weighted_scores_follow_settings() {
        let settings = DiversitySettings {
            term: DiversityTerm::ClassBalance,
            combination: Combination::Product,
            strength: 1.0,
            cell_size: 1.0,
        };
        let units = vec![
            unit(0, 0, 0.5, Some(0), [0.0; 3]),
            unit(0, 1, 0.5, Some(0), [0.0; 3]),
            unit(0, 2, 0.4, Some(1), [0.0; 3]),
        ];
        let w = weighted_scores(&settings, &units);
        assert!(w[2] > w[0]);
        assert_eq!(w[0], w[1]);
    }
}
