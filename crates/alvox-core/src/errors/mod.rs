//! Error handling for alvox.
//! One error enum per subsystem, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod inference_error;
pub mod invariant_error;
pub mod load_error;
pub mod mask_error;
pub mod selection_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use error_code::AlvoxErrorCode;
pub use inference_error::InferenceError;
pub use invariant_error::InvariantViolation;
pub use load_error::LoadError;
pub use mask_error::MaskError;
pub use selection_error::{LoadOutcome, MergeOutcome, SelectionError};
pub use storage_error::StorageError;
