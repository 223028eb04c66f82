//! Per-cloud selections of newly chosen units.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::CloudId;

/// Mapping from cloud id to the sorted, deduplicated voxel indices chosen in
/// one round. Clouds with nothing selected are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    clouds: BTreeMap<CloudId, Vec<u32>>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add indices for a cloud, merging with any already present.
    pub fn insert<I>(&mut self, cloud_id: CloudId, indices: I)
    where
        I: IntoIterator<Item = u32>,
    {
        let entry = self.clouds.entry(cloud_id).or_default();
        entry.extend(indices);
        entry.sort_unstable();
        entry.dedup();
        if entry.is_empty() {
            self.clouds.remove(&cloud_id);
        }
    }

    /// Build a selection holding every labeled unit of the given masks.
    pub fn from_masks<'a, I>(masks: I) -> Self
    where
        I: IntoIterator<Item = (CloudId, &'a [bool])>,
    {
        let mut selection = Self::new();
        for (cloud_id, mask) in masks {
            selection.insert(
                cloud_id,
                mask.iter()
                    .enumerate()
                    .filter(|(_, labeled)| **labeled)
                    .map(|(i, _)| i as u32),
            );
        }
        selection
    }

    pub fn get(&self, cloud_id: CloudId) -> Option<&[u32]> {
        self.clouds.get(&cloud_id).map(Vec::as_slice)
    }

    pub fn contains(&self, cloud_id: CloudId, index: u32) -> bool {
        self.get(cloud_id)
            .is_some_and(|indices| indices.binary_search(&index).is_ok())
    }

    /// Iterate clouds in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (CloudId, &[u32])> {
        self.clouds.iter().map(|(id, v)| (*id, v.as_slice()))
    }

    pub fn cloud_ids(&self) -> impl Iterator<Item = CloudId> + '_ {
        self.clouds.keys().copied()
    }

    pub fn cloud_count(&self) -> usize {
        self.clouds.len()
    }

    /// Total number of selected units across all clouds.
    pub fn total_units(&self) -> usize {
        self.clouds.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }
}
