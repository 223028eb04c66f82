//! Selection granularity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// The kind of unit that is scored, ranked and selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Voxels,
    Superpoints,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Voxels => "Voxels",
            Granularity::Superpoints => "Superpoints",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voxels" | "voxel" => Ok(Granularity::Voxels),
            "superpoints" | "superpoint" => Ok(Granularity::Superpoints),
            _ => Err(ConfigError::UnknownGranularity {
                value: s.to_string(),
            }),
        }
    }
}
