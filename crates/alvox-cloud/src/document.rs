//! On-disk cloud document.
//!
//! One JSON object per cloud. `points` and `label_mask` are required,
//! everything else is optional and validated against the mask length.

use std::path::Path;

use alvox_core::errors::LoadError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudDocument {
    /// Voxel centers, one `[x, y, z]` per unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f32; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_mask: Option<Vec<bool>>,
    /// Per-unit class probabilities from a previous pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<Vec<f32>>>,
    /// Ground-truth class per unit, used for reporting only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superpoint_map: Option<Vec<u32>>,
}

impl CloudDocument {
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| LoadError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the document next to `path` and rename it into place, so a
    /// reader never sees a half-written cloud.
    pub fn write(&self, path: &Path) -> Result<(), LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let body = serde_json::to_vec(self).map_err(|e| LoadError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)
    }

    /// Number of units, taken from the label mask.
    pub fn size(&self) -> Option<usize> {
        self.label_mask.as_ref().map(Vec::len)
    }
}
