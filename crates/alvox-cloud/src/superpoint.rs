//! Grouped reductions over a superpoint partition.
//!
//! All functions are a single pass over the voxels plus a pass over the
//! superpoints, never one mask scan per superpoint.

use alvox_core::CloudId;

/// Per-superpoint mean value and voxel count, indexed by superpoint id.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperpointAverages {
    /// NaN where the superpoint has no non-NaN value (or no voxels).
    pub averages: Vec<f32>,
    /// All member voxels, NaN values included.
    pub sizes: Vec<u64>,
}

/// Four parallel arrays, one entry per superpoint with a valid average.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperpointValues {
    pub values: Vec<f32>,
    pub superpoint_ids: Vec<u32>,
    pub sizes: Vec<u64>,
    pub cloud_ids: Vec<CloudId>,
}

impl SuperpointValues {
    pub fn from_averages(cloud_id: CloudId, averages: &SuperpointAverages) -> Self {
        let mut out = Self::default();
        for (id, (&value, &size)) in averages.averages.iter().zip(&averages.sizes).enumerate() {
            if value.is_nan() {
                continue;
            }
            out.values.push(value);
            out.superpoint_ids.push(id as u32);
            out.sizes.push(size);
            out.cloud_ids.push(cloud_id);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// NaN-aware grouped mean. `map` and `values` have equal length and every
/// map entry is below `num_superpoints`.
pub fn average_by_superpoint(
    map: &[u32],
    values: &[f32],
    num_superpoints: usize,
) -> SuperpointAverages {
    let mut sizes = vec![0u64; num_superpoints];
    let mut sums = vec![0f64; num_superpoints];
    let mut valid = vec![0u64; num_superpoints];

    for (&sp, &value) in map.iter().zip(values) {
        let sp = sp as usize;
        sizes[sp] += 1;
        if !value.is_nan() {
            sums[sp] += f64::from(value);
            valid[sp] += 1;
        }
    }

    let averages = sums
        .iter()
        .zip(&valid)
        .map(|(&sum, &n)| if n == 0 { f32::NAN } else { (sum / n as f64) as f32 })
        .collect();

    SuperpointAverages { averages, sizes }
}

/// Members of every superpoint, stored contiguously (CSR layout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperpointIndex {
    offsets: Vec<usize>,
    members: Vec<u32>,
}

impl SuperpointIndex {
    /// Counting sort of voxel ids by superpoint. Members of each superpoint
    /// keep ascending voxel order.
    pub fn build(map: &[u32], num_superpoints: usize) -> Self {
        let mut offsets = vec![0usize; num_superpoints + 1];
        for &sp in map {
            offsets[sp as usize + 1] += 1;
        }
        for i in 0..num_superpoints {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut members = vec![0u32; map.len()];
        for (voxel, &sp) in map.iter().enumerate() {
            let slot = &mut cursor[sp as usize];
            members[*slot] = voxel as u32;
            *slot += 1;
        }

        Self { offsets, members }
    }

    pub fn members(&self, superpoint: u32) -> &[u32] {
        let sp = superpoint as usize;
        match (self.offsets.get(sp), self.offsets.get(sp + 1)) {
            (Some(&start), Some(&end)) => &self.members[start..end],
            _ => &[],
        }
    }

    pub fn num_superpoints(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_skip_nan_values() {
        let map = [0, 0, 1, 1, 1];
        let values = [1.0, 3.0, f32::NAN, 5.0, 7.0];
        let out = average_by_superpoint(&map, &values, 2);
        assert_eq!(out.averages, vec![2.0, 6.0]);
        assert_eq!(out.sizes, vec![2, 3]);
    }

    #[test]
    fn all_nan_superpoint_is_nan_but_keeps_its_size() {
        let map = [0, 1, 1];
        let values = [4.0, f32::NAN, f32::NAN];
        let out = average_by_superpoint(&map, &values, 2);
        assert_eq!(out.averages[0], 4.0);
        assert!(out.averages[1].is_nan());
        assert_eq!(out.sizes, vec![1, 2]);
    }

    #[test]
    fn absent_superpoint_ids_are_tolerated() {
        // Superpoint 1 has no members.
        let map = [0, 2, 2];
        let out = average_by_superpoint(&map, &[1.0, 2.0, 4.0], 3);
        assert_eq!(out.sizes, vec![1, 0, 2]);
        assert!(out.averages[1].is_nan());
        assert_eq!(out.averages[2], 3.0);
    }

    #[test]
    fn index_groups_members_in_voxel_order() {
        let index = SuperpointIndex::build(&[1, 0, 1, 2, 0], 3);
        assert_eq!(index.members(0), &[1, 4]);
        assert_eq!(index.members(1), &[0, 2]);
        assert_eq!(index.members(2), &[3]);
        assert!(index.members(7).is_empty());
        assert_eq!(index.num_superpoints(), 3);
    }

    #[test]
    fn from_averages_drops_nan_entries() {
        let averages = SuperpointAverages {
            averages: vec![0.5, f32::NAN, 0.25],
            sizes: vec![3, 1, 2],
        };
        let values = SuperpointValues::from_averages(CloudId(4), &averages);
        assert_eq!(values.values, vec![0.5, 0.25]);
        assert_eq!(values.superpoint_ids, vec![0, 2]);
        assert_eq!(values.sizes, vec![3, 2]);
        assert_eq!(values.cloud_ids, vec![CloudId(4), CloudId(4)]);
    }
}
