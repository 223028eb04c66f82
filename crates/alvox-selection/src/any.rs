//! Granularity dispatch over the two selector instantiations.

use std::path::PathBuf;

use alvox_core::errors::{ConfigError, LoadOutcome, MergeOutcome, SelectionError};
use alvox_core::traits::{CloudMaskRecord, SegmentationModel, SelectionDataset};
use alvox_core::{AlvoxConfig, Criterion, Granularity, Selection};

use crate::selector::{SelectionOutcome, SuperpointSelector, VoxelSelector};
use crate::settings::SelectorSettings;
use crate::statistics::DatasetStatistics;

/// A selector at the configured granularity.
pub enum AnySelector {
    Voxels(VoxelSelector),
    Superpoints(SuperpointSelector),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            AnySelector::Voxels($s) => $body,
            AnySelector::Superpoints($s) => $body,
        }
    };
}

impl AnySelector {
    /// Resolve settings from `config` and load `paths` at its granularity.
    pub fn from_config(
        paths: &[PathBuf],
        config: &AlvoxConfig,
    ) -> Result<LoadOutcome<Self>, ConfigError> {
        let settings = SelectorSettings::from_config(config)?;
        Ok(Self::load(paths, config.selection.effective_granularity()?, settings))
    }

    pub fn load(
        paths: &[PathBuf],
        granularity: Granularity,
        settings: SelectorSettings,
    ) -> LoadOutcome<Self> {
        match granularity {
            Granularity::Voxels => {
                let outcome = VoxelSelector::from_paths(paths, settings);
                LoadOutcome {
                    value: AnySelector::Voxels(outcome.value),
                    errors: outcome.errors,
                }
            }
            Granularity::Superpoints => {
                let outcome = SuperpointSelector::from_paths(paths, settings);
                LoadOutcome {
                    value: AnySelector::Superpoints(outcome.value),
                    errors: outcome.errors,
                }
            }
        }
    }

    pub fn granularity(&self) -> Granularity {
        dispatch!(self, s => s.granularity())
    }

    pub fn settings(&self) -> &SelectorSettings {
        dispatch!(self, s => s.settings())
    }

    pub fn cloud_count(&self) -> usize {
        dispatch!(self, s => s.cloud_count())
    }

    pub fn select(
        &mut self,
        dataset: &dyn SelectionDataset,
        model: Option<&dyn SegmentationModel>,
        percentage: f64,
    ) -> Result<SelectionOutcome, SelectionError> {
        dispatch!(self, s => s.select(dataset, model, percentage))
    }

    pub fn select_with_criterion(
        &mut self,
        criterion: Criterion,
        dataset: &dyn SelectionDataset,
        model: Option<&dyn SegmentationModel>,
        percentage: f64,
    ) -> Result<SelectionOutcome, SelectionError> {
        dispatch!(self, s => s.select_with_criterion(criterion, dataset, model, percentage))
    }

    pub fn load_voxel_selection(
        &mut self,
        selection: &Selection,
        dataset: &mut dyn SelectionDataset,
    ) -> MergeOutcome {
        dispatch!(self, s => s.load_voxel_selection(selection, dataset))
    }

    pub fn restore_masks(
        &mut self,
        records: &[CloudMaskRecord],
        dataset: &mut dyn SelectionDataset,
    ) -> MergeOutcome {
        dispatch!(self, s => s.restore_masks(records, dataset))
    }

    pub fn labeled_ratio(&self) -> f64 {
        dispatch!(self, s => s.labeled_ratio())
    }

    pub fn is_finished(&self) -> bool {
        dispatch!(self, s => s.is_finished())
    }

    pub fn eligible_count(&self) -> usize {
        dispatch!(self, s => s.eligible_count())
    }

    pub fn masks(&self) -> Vec<CloudMaskRecord> {
        dispatch!(self, s => s.masks())
    }

    pub fn statistics(&self) -> DatasetStatistics {
        dispatch!(self, s => s.statistics())
    }
}

impl From<VoxelSelector> for AnySelector {
    fn from(selector: VoxelSelector) -> Self {
        AnySelector::Voxels(selector)
    }
}

impl From<SuperpointSelector> for AnySelector {
    fn from(selector: SuperpointSelector) -> Self {
        AnySelector::Superpoints(selector)
    }
}
