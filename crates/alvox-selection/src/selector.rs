//! The ranking core shared by voxel and superpoint selection.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use alvox_cloud::{Cloud, Selectable, SuperpointCloud};
use alvox_core::config::selection_config::check_percentage;
use alvox_core::config::SuperpointBudget;
use alvox_core::constants::LABEL_RATIO_TOLERANCE;
use alvox_core::errors::{
    ConfigError, InvariantViolation, LoadError, LoadOutcome, MaskError, MergeOutcome,
    SelectionError,
};
use alvox_core::traits::{CloudMaskRecord, SegmentationModel, SelectionDataset};
use alvox_core::{CloudId, Criterion, Granularity, Selection, UnitCandidate};
use alvox_metrics::{voxel_scores, weighted_scores, MetricStatistics};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::inference::predict_voxels;
use crate::ranking::{rank, take_units, take_voxels};
use crate::settings::SelectorSettings;
use crate::statistics::DatasetStatistics;

/// Clouds that can be read from a cloud document.
pub trait LoadCloud: Sized {
    fn load(path: &Path, id: CloudId) -> Result<Self, LoadError>;
}

impl LoadCloud for Cloud {
    fn load(path: &Path, id: CloudId) -> Result<Self, LoadError> {
        Cloud::load(path, id)
    }
}

impl LoadCloud for SuperpointCloud {
    fn load(path: &Path, id: CloudId) -> Result<Self, LoadError> {
        SuperpointCloud::load(path, id)
    }
}

/// Result of one `select` call. Masks are untouched until the selection
/// is merged with `load_voxel_selection`.
#[derive(Debug, Clone, Default)]
pub struct SelectionOutcome {
    pub selection: Selection,
    /// Raw-score statistics; absent for the random criterion.
    pub unweighted: Option<MetricStatistics>,
    /// Diversity-weighted statistics; present only when weighting ran.
    pub weighted: Option<MetricStatistics>,
    pub eligible_units: usize,
    pub selected_units: usize,
}

impl SelectionOutcome {
    /// Statistics keyed by kind, for persistence.
    pub fn statistics_json(&self) -> BTreeMap<String, serde_json::Value> {
        [&self.unweighted, &self.weighted]
            .into_iter()
            .flatten()
            .map(|stats| (stats.kind().to_string(), stats.to_json()))
            .collect()
    }
}

pub type VoxelSelector = Selector<Cloud>;
pub type SuperpointSelector = Selector<SuperpointCloud>;

/// Owns the clouds of a dataset, keyed by id, and selects their next
/// units to label.
pub struct Selector<C> {
    clouds: BTreeMap<CloudId, C>,
    settings: SelectorSettings,
}

impl<C: Selectable + LoadCloud> Selector<C> {
    /// Load every cloud of `paths`; the position in `paths` is the cloud id.
    /// A cloud that fails to load is skipped and reported in the outcome.
    pub fn from_paths(paths: &[PathBuf], settings: SelectorSettings) -> LoadOutcome<Self> {
        let mut clouds = Vec::with_capacity(paths.len());
        let mut errors = Vec::new();
        for (i, path) in paths.iter().enumerate() {
            let id = CloudId(i as u32);
            match C::load(path, id) {
                Ok(cloud) => clouds.push(cloud),
                Err(e) => {
                    tracing::warn!(cloud_id = %id, error = %e, "skipping cloud that failed to load");
                    errors.push(e);
                }
            }
        }
        LoadOutcome {
            value: Self::new(clouds, settings),
            errors,
        }
    }
}

impl<C: Selectable> Selector<C> {
    pub fn new(clouds: Vec<C>, settings: SelectorSettings) -> Self {
        let clouds = clouds.into_iter().map(|c| (c.id(), c)).collect();
        Self { clouds, settings }
    }

    pub fn settings(&self) -> &SelectorSettings {
        &self.settings
    }

    pub fn cloud(&self, id: CloudId) -> Option<&C> {
        self.clouds.get(&id)
    }

    pub fn clouds(&self) -> impl Iterator<Item = &C> {
        self.clouds.values()
    }

    pub fn cloud_count(&self) -> usize {
        self.clouds.len()
    }

    /// Select with the configured criterion.
    pub fn select(
        &mut self,
        dataset: &dyn SelectionDataset,
        model: Option<&dyn SegmentationModel>,
        percentage: f64,
    ) -> Result<SelectionOutcome, SelectionError> {
        self.select_with_criterion(self.settings.criterion, dataset, model, percentage)
    }

    /// Score, rank and cut the eligible pool. Only predictions are
    /// refreshed; label masks are never touched.
    pub fn select_with_criterion(
        &mut self,
        criterion: Criterion,
        dataset: &dyn SelectionDataset,
        model: Option<&dyn SegmentationModel>,
        percentage: f64,
    ) -> Result<SelectionOutcome, SelectionError> {
        check_percentage("percentage", percentage)?;

        let candidates = match (criterion, model) {
            (Criterion::Random, _) => self.random_candidates(),
            (_, Some(model)) => self.model_candidates(criterion, dataset, model)?,
            (_, None) => {
                return Err(ConfigError::ModelRequired {
                    criterion: criterion.to_string(),
                }
                .into())
            }
        };

        let span = alvox_core::ranking_span!(criterion, candidates.len());
        let _guard = span.enter();

        let raw: Vec<f32> = candidates.iter().map(|c| c.score).collect();
        let diversity = self
            .settings
            .diversity
            .filter(|_| criterion.requires_model() && !candidates.is_empty());
        let ranking_scores = match &diversity {
            Some(settings) => weighted_scores(settings, &candidates),
            None => raw.clone(),
        };

        let order = rank(&ranking_scores);
        let picked = match self.settings.superpoint_budget {
            SuperpointBudget::Voxels if C::GRANULARITY == Granularity::Superpoints => {
                take_voxels(&order, &candidates, percentage)
            }
            _ => take_units(&order, percentage),
        };

        let mut flags = vec![false; candidates.len()];
        let mut selection = Selection::new();
        for &i in &picked {
            flags[i] = true;
            let unit = &candidates[i];
            if let Some(cloud) = self.clouds.get(&unit.cloud_id) {
                selection.insert(unit.cloud_id, cloud.unit_voxels(unit.unit));
            }
        }
        self.check_unlabeled(&selection)?;

        let (unweighted, weighted) = if criterion.requires_model() {
            let unweighted = MetricStatistics::compute(criterion, false, &raw, &flags);
            let weighted = diversity
                .is_some()
                .then(|| MetricStatistics::compute(criterion, true, &ranking_scores, &flags));
            (Some(unweighted), weighted)
        } else {
            (None, None)
        };

        tracing::info!(
            %criterion,
            eligible_units = candidates.len(),
            selected_units = picked.len(),
            selected_voxels = selection.total_units(),
            weighted = diversity.is_some(),
            "selection ranked"
        );

        Ok(SelectionOutcome {
            selection,
            unweighted,
            weighted,
            eligible_units: candidates.len(),
            selected_units: picked.len(),
        })
    }

    /// Uniform `[0, 1)` draws in ascending (cloud, unit) order.
    fn random_candidates(&self) -> Vec<UnitCandidate> {
        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        let mut candidates: Vec<UnitCandidate> = self
            .clouds
            .values()
            .flat_map(|cloud| cloud.eligible_units())
            .collect();
        for candidate in &mut candidates {
            candidate.score = rng.gen::<f32>();
        }
        candidates
    }

    fn model_candidates(
        &mut self,
        criterion: Criterion,
        dataset: &dyn SelectionDataset,
        model: &dyn SegmentationModel,
    ) -> Result<Vec<UnitCandidate>, SelectionError> {
        let sizes: BTreeMap<CloudId, usize> =
            self.clouds.iter().map(|(&id, c)| (id, c.size())).collect();
        let mut predictions = predict_voxels(
            dataset,
            model,
            &sizes,
            self.settings.batch_size,
            self.settings.model_output,
        )?;

        for (id, cloud) in self.clouds.iter_mut() {
            match predictions.remove(id) {
                Some(probabilities) => cloud.set_predictions(probabilities)?,
                // Predictions from an earlier round or the document must not rank this one.
                None => {
                    tracing::warn!(cloud_id = %id, "no dataset items for cloud");
                    cloud.clear_predictions();
                }
            }
        }

        let per_cloud: Vec<Vec<UnitCandidate>> = self
            .clouds
            .par_iter()
            .map(|(_, cloud)| match cloud.base().predictions() {
                Some(probabilities) => {
                    let scores = voxel_scores(criterion, probabilities.view(), cloud.label_mask());
                    cloud.scored_units(&scores)
                }
                None => Ok(Vec::new()),
            })
            .collect::<Result<_, InvariantViolation>>()?;

        Ok(per_cloud.into_iter().flatten().collect())
    }

    pub fn granularity(&self) -> Granularity {
        C::GRANULARITY
    }

    fn check_unlabeled(&self, selection: &Selection) -> Result<(), InvariantViolation> {
        for (cloud_id, indices) in selection.iter() {
            let Some(cloud) = self.clouds.get(&cloud_id) else {
                continue;
            };
            let mask = cloud.label_mask();
            if let Some(&i) = indices.iter().find(|&&i| mask[i as usize]) {
                return Err(InvariantViolation::LabeledUnitSelected {
                    cloud_id,
                    index: i as usize,
                });
            }
        }
        Ok(())
    }

    /// Merge a selection into the label masks and push every updated mask
    /// to the dataset.
    ///
    /// Clouds merge independently: an unknown cloud id or an out-of-range
    /// index leaves that cloud untouched and is reported in the outcome.
    /// Replaying a merged selection labels nothing new.
    pub fn load_voxel_selection(
        &mut self,
        selection: &Selection,
        dataset: &mut dyn SelectionDataset,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for (cloud_id, indices) in selection.iter() {
            let Some(cloud) = self.clouds.get_mut(&cloud_id) else {
                tracing::warn!(cloud_id = %cloud_id, "selection references unknown cloud");
                outcome.errors.push(MaskError::UnknownCloud { cloud_id });
                continue;
            };
            match cloud.update_label_mask(indices) {
                Ok(newly) => {
                    outcome.newly_labeled += newly;
                    outcome.merged_clouds.push(cloud_id);
                    dataset.update_label_mask(cloud_id, cloud.label_mask());
                }
                Err(e) => {
                    tracing::warn!(cloud_id = %cloud_id, error = %e, "cloud left unmerged");
                    outcome.errors.push(e);
                }
            }
        }
        tracing::debug!(
            merged = outcome.merged_clouds.len(),
            newly_labeled = outcome.newly_labeled,
            errors = outcome.error_count(),
            "selection merged"
        );
        outcome
    }

    /// Apply persisted masks. Stored labels are only ever added.
    pub fn restore_masks(
        &mut self,
        records: &[CloudMaskRecord],
        dataset: &mut dyn SelectionDataset,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for record in records {
            let Some(cloud) = self.clouds.get_mut(&record.cloud_id) else {
                outcome.errors.push(MaskError::UnknownCloud {
                    cloud_id: record.cloud_id,
                });
                continue;
            };
            if record.mask.len() != cloud.size() {
                outcome.errors.push(MaskError::SizeMismatch {
                    cloud_id: record.cloud_id,
                    expected: cloud.size(),
                    actual: record.mask.len(),
                });
                continue;
            }
            let labeled: Vec<u32> = record
                .mask
                .iter()
                .enumerate()
                .filter(|(_, l)| **l)
                .map(|(i, _)| i as u32)
                .collect();
            match cloud.update_label_mask(&labeled) {
                Ok(newly) => {
                    outcome.newly_labeled += newly;
                    outcome.merged_clouds.push(record.cloud_id);
                    dataset.update_label_mask(record.cloud_id, cloud.label_mask());
                }
                Err(e) => outcome.errors.push(e),
            }
        }
        outcome
    }

    /// Cumulative labeled fraction over every voxel. 1.0 when empty.
    pub fn labeled_ratio(&self) -> f64 {
        let (labeled, total) = self
            .clouds
            .values()
            .fold((0usize, 0usize), |(l, t), c| (l + c.labeled_count(), t + c.size()));
        if total == 0 {
            1.0
        } else {
            labeled as f64 / total as f64
        }
    }

    /// Target ratio reached, or nothing left to label.
    pub fn is_finished(&self) -> bool {
        let target = self.settings.target_percentage / 100.0;
        self.labeled_ratio() >= target - LABEL_RATIO_TOLERANCE
            || self.clouds.values().all(|c| c.is_fully_labeled())
    }

    /// Number of units still eligible for selection.
    pub fn eligible_count(&self) -> usize {
        self.clouds.values().map(|c| c.eligible_units().len()).sum()
    }

    /// Current masks, ordered by cloud id.
    pub fn masks(&self) -> Vec<CloudMaskRecord> {
        self.clouds
            .values()
            .map(|c| CloudMaskRecord {
                cloud_id: c.id(),
                path: c.path().display().to_string(),
                mask: c.label_mask().to_vec(),
            })
            .collect()
    }

    pub fn statistics(&self) -> DatasetStatistics {
        DatasetStatistics::compute(self.clouds.values().map(|c| c.base()))
    }
}
