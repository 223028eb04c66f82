//! # alvox-core
//!
//! Foundation crate for the alvox active selection engine.
//! Defines ids, selection types, collaborator traits, errors, config,
//! tracing setup, and constants. Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::AlvoxConfig;
pub use errors::{AlvoxErrorCode, SelectionError};
pub use types::{CloudId, Criterion, Granularity, Selection, UnitCandidate};
