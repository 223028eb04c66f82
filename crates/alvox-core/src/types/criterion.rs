//! Selection criteria.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// How a unit is scored before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    /// Uniform random score from a seeded generator. Needs no model.
    Random,
    /// Shannon entropy of the class distribution.
    EntropyUncertainty,
    /// One minus the gap between the two most likely classes.
    MarginUncertainty,
    /// One minus the top class probability.
    LeastConfidence,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::Random,
        Criterion::EntropyUncertainty,
        Criterion::MarginUncertainty,
        Criterion::LeastConfidence,
    ];

    /// Whether scoring requires model inference.
    pub fn requires_model(self) -> bool {
        !matches!(self, Criterion::Random)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Random => "Random",
            Criterion::EntropyUncertainty => "EntropyUncertainty",
            Criterion::MarginUncertainty => "MarginUncertainty",
            Criterion::LeastConfidence => "LeastConfidence",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = ConfigError;

    /// Accepts the canonical names plus the short snake-case aliases
    /// (`random`, `entropy`, `margin`, `least_confidence`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "random" => Ok(Criterion::Random),
            "entropy" | "entropyuncertainty" => Ok(Criterion::EntropyUncertainty),
            "margin" | "marginuncertainty" => Ok(Criterion::MarginUncertainty),
            "leastconfidence" | "leastconfidenceuncertainty" => Ok(Criterion::LeastConfidence),
            _ => Err(ConfigError::UnknownCriterion {
                value: s.to_string(),
            }),
        }
    }
}
