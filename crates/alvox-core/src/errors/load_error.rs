//! Cloud loading errors.

use std::path::PathBuf;

use super::error_code::{self, AlvoxErrorCode};

/// Errors raised while reading a cloud document from disk.
/// Fatal for the affected cloud only; the cloud is skipped and reported.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed cloud document {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Cloud {path} is missing required array `{array}`")]
    MissingArray { path: PathBuf, array: &'static str },

    #[error("Cloud {path}: array `{array}` has {actual} entries, expected {expected}")]
    SizeMismatch {
        path: PathBuf,
        array: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Cloud {path}: array `{array}` row {row} has width {actual}, expected {expected}")]
    RaggedArray {
        path: PathBuf,
        array: &'static str,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

impl LoadError {
    /// The path of the cloud that failed to load.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. }
            | Self::Malformed { path, .. }
            | Self::MissingArray { path, .. }
            | Self::SizeMismatch { path, .. }
            | Self::RaggedArray { path, .. } => path,
        }
    }
}

impl AlvoxErrorCode for LoadError {
    fn error_code(&self) -> &'static str {
        error_code::LOAD_ERROR
    }
}
