//! Observability for alvox.
//! `tracing` crate with `EnvFilter`, per-crate log levels, and span macros
//! (`round_span!`, `inference_span!`, `ranking_span!`) exported at the crate root.

pub mod setup;
pub mod spans;

pub use setup::init_tracing;
