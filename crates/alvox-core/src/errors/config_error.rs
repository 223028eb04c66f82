//! Configuration errors.

use super::error_code::{self, AlvoxErrorCode};

/// Errors that can occur during configuration loading and validation.
/// Raised before any selector state is created.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Config parse error in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Config validation failed for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Invalid value for environment variable {name}: {message}")]
    InvalidEnvValue { name: String, message: String },

    #[error("Unknown selection criterion: {value}")]
    UnknownCriterion { value: String },

    #[error("Unknown granularity: {value} (expected Voxels or Superpoints)")]
    UnknownGranularity { value: String },

    #[error("{field} = {value} is outside [0, 100]")]
    PercentageOutOfRange { field: String, value: f64 },

    #[error("Criterion {criterion} requires a model but none was supplied")]
    ModelRequired { criterion: String },
}

impl AlvoxErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
