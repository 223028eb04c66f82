//! Storage errors for the persisted mask and selection history.

use super::error_code::{self, AlvoxErrorCode};
use crate::types::CloudId;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Corrupt record: {details}")]
    CorruptRecord { details: String },

    #[error("Cloud {cloud_id}: persisted mask would unlabel {lost} units")]
    MaskRegression { cloud_id: CloudId, lost: usize },
}

impl AlvoxErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::SqliteError { .. } => error_code::STORAGE_ERROR,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::CorruptRecord { .. } => error_code::CORRUPT_RECORD,
            Self::MaskRegression { .. } => error_code::INVARIANT_VIOLATION,
        }
    }
}
