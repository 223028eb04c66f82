//! Top-level alvox configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::selection_config::check_percentage;
use super::{DiversityConfig, SelectionConfig, StorageConfig};
use crate::constants::CONFIG_FILE_NAME;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Explicit overrides (applied via `apply_overrides`)
/// 2. Environment variables (`ALVOX_*`)
/// 3. Project config (`alvox.toml` in the root)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AlvoxConfig {
    pub selection: SelectionConfig,
    pub diversity: DiversityConfig,
    pub storage: StorageConfig,
}

/// Caller-supplied overrides, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub criterion: Option<String>,
    pub granularity: Option<String>,
    pub percentage: Option<f64>,
    pub seed: Option<u64>,
}

impl AlvoxConfig {
    /// Load configuration from `root`, the environment and `overrides`,
    /// then validate it.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config)?;

        if let Some(overrides) = overrides {
            Self::apply_overrides(&mut config, overrides);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &AlvoxConfig) -> Result<(), ConfigError> {
        config.selection.effective_criterion()?;
        config.selection.effective_granularity()?;
        check_percentage("selection.percentage", config.selection.effective_percentage())?;
        check_percentage(
            "selection.target_percentage",
            config.selection.effective_target_percentage(),
        )?;
        if config.selection.effective_batch_size() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "selection.batch_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        config.diversity.settings()?;
        Ok(())
    }

    fn merge_toml_file(config: &mut AlvoxConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: AlvoxConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it has a value.
    fn merge(base: &mut AlvoxConfig, other: &AlvoxConfig) {
        let s = &other.selection;
        if s.criterion.is_some() {
            base.selection.criterion = s.criterion.clone();
        }
        if s.granularity.is_some() {
            base.selection.granularity = s.granularity.clone();
        }
        if s.percentage.is_some() {
            base.selection.percentage = s.percentage;
        }
        if s.target_percentage.is_some() {
            base.selection.target_percentage = s.target_percentage;
        }
        if s.seed.is_some() {
            base.selection.seed = s.seed;
        }
        if s.initial_random.is_some() {
            base.selection.initial_random = s.initial_random;
        }
        if s.superpoint_budget.is_some() {
            base.selection.superpoint_budget = s.superpoint_budget;
        }
        if s.batch_size.is_some() {
            base.selection.batch_size = s.batch_size;
        }
        if s.model_output.is_some() {
            base.selection.model_output = s.model_output;
        }

        let d = &other.diversity;
        if d.enabled.is_some() {
            base.diversity.enabled = d.enabled;
        }
        if d.term.is_some() {
            base.diversity.term = d.term;
        }
        if d.combination.is_some() {
            base.diversity.combination = d.combination;
        }
        if d.strength.is_some() {
            base.diversity.strength = d.strength;
        }
        if d.cell_size.is_some() {
            base.diversity.cell_size = d.cell_size;
        }

        if other.storage.path.is_some() {
            base.storage.path = other.storage.path.clone();
        }
    }

    /// Apply `ALVOX_*` environment variables.
    fn apply_env_overrides(config: &mut AlvoxConfig) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("ALVOX_CRITERION") {
            config.selection.criterion = Some(val);
        }
        if let Ok(val) = std::env::var("ALVOX_GRANULARITY") {
            config.selection.granularity = Some(val);
        }
        if let Ok(val) = std::env::var("ALVOX_PERCENTAGE") {
            config.selection.percentage = Some(parse_env("ALVOX_PERCENTAGE", &val)?);
        }
        if let Ok(val) = std::env::var("ALVOX_TARGET_PERCENTAGE") {
            config.selection.target_percentage =
                Some(parse_env("ALVOX_TARGET_PERCENTAGE", &val)?);
        }
        if let Ok(val) = std::env::var("ALVOX_SEED") {
            config.selection.seed = Some(parse_env("ALVOX_SEED", &val)?);
        }
        if let Ok(val) = std::env::var("ALVOX_DIVERSITY") {
            config.diversity.enabled = Some(parse_env("ALVOX_DIVERSITY", &val)?);
        }
        if let Ok(val) = std::env::var("ALVOX_DATABASE") {
            config.storage.path = Some(val.into());
        }
        Ok(())
    }

    /// Apply explicit overrides (highest priority).
    pub fn apply_overrides(config: &mut AlvoxConfig, overrides: &ConfigOverrides) {
        if overrides.criterion.is_some() {
            config.selection.criterion = overrides.criterion.clone();
        }
        if overrides.granularity.is_some() {
            config.selection.granularity = overrides.granularity.clone();
        }
        if overrides.percentage.is_some() {
            config.selection.percentage = overrides.percentage;
        }
        if overrides.seed.is_some() {
            config.selection.seed = overrides.seed;
        }
    }

    /// Serialize the config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialize>".to_string(),
            message: e.to_string(),
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvValue {
            name: name.to_string(),
            message: e.to_string(),
        })
}
