//! Diversity-aware weighting configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DENSITY_CELL_SIZE, DEFAULT_DIVERSITY_STRENGTH};
use crate::errors::ConfigError;

/// The spread-favoring term combined with the raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityTerm {
    /// `N / (K * n_c)` for the unit's dominant predicted class `c`.
    ClassBalance,
    /// `1 / (1 + m)` with `m` other eligible units in the same grid cell.
    InverseDensity,
}

/// How the raw score `s` and the diversity term `d` are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combination {
    /// `s * d^strength`.
    Product,
    /// `(1 - strength) * norm(s) + strength * norm(d)`, min-max normalized.
    Additive,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DiversityConfig {
    /// Enable diversity-aware weighting. Default: false.
    pub enabled: Option<bool>,
    /// Default: "class_balance".
    pub term: Option<DiversityTerm>,
    /// Default: "product".
    pub combination: Option<Combination>,
    /// Default: 1.0. Must lie in [0, 1] for "additive".
    pub strength: Option<f64>,
    /// Grid cell edge for "inverse_density". Default: 1.0.
    pub cell_size: Option<f64>,
}

/// Resolved diversity settings, present only when weighting is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversitySettings {
    pub term: DiversityTerm,
    pub combination: Combination,
    pub strength: f64,
    pub cell_size: f64,
}

impl DiversityConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// The validated settings, or `None` when weighting is disabled.
    pub fn settings(&self) -> Result<Option<DiversitySettings>, ConfigError> {
        if !self.is_enabled() {
            return Ok(None);
        }
        let settings = DiversitySettings {
            term: self.term.unwrap_or(DiversityTerm::ClassBalance),
            combination: self.combination.unwrap_or(Combination::Product),
            strength: self.strength.unwrap_or(DEFAULT_DIVERSITY_STRENGTH),
            cell_size: self.cell_size.unwrap_or(DEFAULT_DENSITY_CELL_SIZE),
        };
        settings.validate()?;
        Ok(Some(settings))
    }
}

impl DiversitySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.strength >= 0.0 && self.strength.is_finite()) {
            return Err(ConfigError::ValidationFailed {
                field: "diversity.strength".to_string(),
                message: "must be a finite value >= 0".to_string(),
            });
        }
        if self.combination == Combination::Additive && self.strength > 1.0 {
            return Err(ConfigError::ValidationFailed {
                field: "diversity.strength".to_string(),
                message: "must be between 0.0 and 1.0 for additive combination".to_string(),
            });
        }
        if !(self.cell_size > 0.0 && self.cell_size.is_finite()) {
            return Err(ConfigError::ValidationFailed {
                field: "diversity.cell_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}
