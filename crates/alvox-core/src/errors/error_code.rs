//! AlvoxErrorCode trait for machine-readable error reporting.

/// Every error enum implements this to expose a stable error code string
/// that reporting sinks can group on.
pub trait AlvoxErrorCode {
    /// Returns the error code string (e.g., "LOAD_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const LOAD_ERROR: &str = "LOAD_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INDEX_ERROR: &str = "INDEX_ERROR";
pub const UNKNOWN_CLOUD: &str = "UNKNOWN_CLOUD";
pub const INVARIANT_VIOLATION: &str = "INVARIANT_VIOLATION";
pub const INFERENCE_ERROR: &str = "INFERENCE_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CORRUPT_RECORD: &str = "CORRUPT_RECORD";
