//! Resolved selector settings.

use alvox_core::config::{DiversitySettings, ModelOutput, SuperpointBudget};
use alvox_core::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_PERCENTAGE, DEFAULT_SEED, DEFAULT_TARGET_PERCENTAGE,
};
use alvox_core::errors::ConfigError;
use alvox_core::{AlvoxConfig, Criterion};

/// Everything a selector needs from the configuration, validated once.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorSettings {
    pub criterion: Criterion,
    pub percentage: f64,
    pub target_percentage: f64,
    pub seed: u64,
    pub diversity: Option<DiversitySettings>,
    pub superpoint_budget: SuperpointBudget,
    pub batch_size: usize,
    pub model_output: ModelOutput,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            criterion: Criterion::Random,
            percentage: DEFAULT_PERCENTAGE,
            target_percentage: DEFAULT_TARGET_PERCENTAGE,
            seed: DEFAULT_SEED,
            diversity: None,
            superpoint_budget: SuperpointBudget::Superpoints,
            batch_size: DEFAULT_BATCH_SIZE,
            model_output: ModelOutput::Logits,
        }
    }
}

impl SelectorSettings {
    pub fn from_config(config: &AlvoxConfig) -> Result<Self, ConfigError> {
        AlvoxConfig::validate(config)?;
        let s = &config.selection;
        Ok(Self {
            criterion: s.effective_criterion()?,
            percentage: s.effective_percentage(),
            target_percentage: s.effective_target_percentage(),
            seed: s.effective_seed(),
            diversity: config.diversity.settings()?,
            superpoint_budget: s.effective_superpoint_budget(),
            batch_size: s.effective_batch_size(),
            model_output: s.effective_model_output(),
        })
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_diversity(mut self, diversity: DiversitySettings) -> Self {
        self.diversity = Some(diversity);
        self
    }

    pub fn with_target_percentage(mut self, target: f64) -> Self {
        self.target_percentage = target;
        self
    }
}
