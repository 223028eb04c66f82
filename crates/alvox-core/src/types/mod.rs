//! Core domain types shared across the workspace.

pub mod candidate;
pub mod criterion;
pub mod granularity;
pub mod ids;
pub mod selection;

pub use candidate::UnitCandidate;
pub use criterion::Criterion;
pub use granularity::Granularity;
pub use ids::CloudId;
pub use selection::Selection;
