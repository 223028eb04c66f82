//! Selector configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_PERCENTAGE, DEFAULT_SEED, DEFAULT_TARGET_PERCENTAGE,
};
use crate::errors::ConfigError;
use crate::types::{Criterion, Granularity};

/// How the budget of a superpoint round is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperpointBudget {
    /// `percentage` of the eligible superpoints.
    Superpoints,
    /// Superpoints in rank order until `percentage` of the eligible voxels is covered.
    Voxels,
}

/// What the model's `forward` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOutput {
    Logits,
    Probabilities,
}

/// Configuration for the selection engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SelectionConfig {
    /// Scoring criterion. Default: "Random".
    pub criterion: Option<String>,
    /// "Voxels" | "Superpoints". Default: "Voxels".
    pub granularity: Option<String>,
    /// Percentage of eligible units selected per round. Default: 1.0.
    pub percentage: Option<f64>,
    /// Cumulative labeled percentage at which selection is finished. Default: 100.0.
    pub target_percentage: Option<f64>,
    /// Seed for the random criterion. Default: 0.
    pub seed: Option<u64>,
    /// Use the random criterion when no round has been recorded yet. Default: true.
    pub initial_random: Option<bool>,
    /// "superpoints" | "voxels". Default: "superpoints".
    pub superpoint_budget: Option<SuperpointBudget>,
    /// Points per model forward call. Default: 65536.
    pub batch_size: Option<usize>,
    /// "logits" | "probabilities". Default: "logits".
    pub model_output: Option<ModelOutput>,
}

impl SelectionConfig {
    pub fn effective_criterion(&self) -> Result<Criterion, ConfigError> {
        match &self.criterion {
            Some(name) => Criterion::from_str(name),
            None => Ok(Criterion::Random),
        }
    }

    pub fn effective_granularity(&self) -> Result<Granularity, ConfigError> {
        match &self.granularity {
            Some(name) => Granularity::from_str(name),
            None => Ok(Granularity::Voxels),
        }
    }

    pub fn effective_percentage(&self) -> f64 {
        self.percentage.unwrap_or(DEFAULT_PERCENTAGE)
    }

    pub fn effective_target_percentage(&self) -> f64 {
        self.target_percentage.unwrap_or(DEFAULT_TARGET_PERCENTAGE)
    }

    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn effective_initial_random(&self) -> bool {
        self.initial_random.unwrap_or(true)
    }

    pub fn effective_superpoint_budget(&self) -> SuperpointBudget {
        self.superpoint_budget.unwrap_or(SuperpointBudget::Superpoints)
    }

    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn effective_model_output(&self) -> ModelOutput {
        self.model_output.unwrap_or(ModelOutput::Logits)
    }
}

/// Reject percentages outside `[0, 100]`, including NaN.
pub fn check_percentage(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::PercentageOutOfRange {
            field: field.to_string(),
            value,
        })
    }
}
