//! Configuration system for alvox.
//! TOML-based, layered resolution: overrides > env > project file > defaults.

pub mod alvox_config;
pub mod diversity_config;
pub mod selection_config;
pub mod storage_config;

pub use alvox_config::{AlvoxConfig, ConfigOverrides};
pub use diversity_config::{Combination, DiversityConfig, DiversitySettings, DiversityTerm};
pub use selection_config::{ModelOutput, SelectionConfig, SuperpointBudget};
pub use storage_config::StorageConfig;
