//! # alvox-metrics
//!
//! Per-point and per-unit numerics used by the selectors: softmax,
//! uncertainty measures, projection of point predictions onto voxels,
//! diversity terms, and summary statistics over score distributions.
//!
//! Everything here is pure and synchronous. No function touches a label
//! mask except to read it.

pub mod diversity;
pub mod projection;
pub mod softmax;
pub mod statistics;
pub mod uncertainty;

pub use diversity::{class_balance, combine, inverse_density, weighted_scores};
pub use projection::{voxel_scores, PredictionAccumulator};
pub use softmax::{softmax_in_place, softmax_rows};
pub use statistics::{MetricStatistics, ScoreSummary};
pub use uncertainty::{criterion_score, entropy, least_confidence, margin};
