//! # alvox-cloud
//!
//! Per-cloud state of the selection engine: voxel coordinates, mean
//! predictions, and the monotone label mask. `SuperpointCloud` adds a
//! superpoint partition and grouped statistics over it.
//!
//! Capabilities are traits rather than a class hierarchy:
//! `LabeledUnits` (mask + size), `SuperpointAggregate` (partition
//! statistics) and `Selectable` (what the ranking core needs).

pub mod cloud;
pub mod document;
pub mod superpoint;
pub mod superpoint_cloud;
pub mod units;

pub use cloud::Cloud;
pub use document::CloudDocument;
pub use superpoint::{SuperpointAverages, SuperpointIndex, SuperpointValues};
pub use superpoint_cloud::SuperpointCloud;
pub use units::{LabeledUnits, Selectable, SuperpointAggregate};
