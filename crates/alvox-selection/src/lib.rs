//! # alvox-selection
//!
//! The active selection engine. One ranking core, `Selector<C>`, serves
//! both granularities: `VoxelSelector` ranks voxels, `SuperpointSelector`
//! ranks superpoints by the mean score of their unlabeled voxels.
//!
//! A round is: score eligible units (seeded random draws or model
//! uncertainty projected onto voxels), optionally weight them for
//! diversity, rank, cut at the budget, expand to voxels, merge into the
//! label masks. `SelectionEngine` adds persistence and reporting around it.

pub mod any;
pub mod engine;
pub mod inference;
pub mod ranking;
pub mod report;
pub mod selector;
pub mod settings;
pub mod statistics;

pub use any::AnySelector;
pub use engine::{RoundSummary, SelectionEngine};
pub use report::{JsonLinesSink, MemorySink, TracingSink};
pub use selector::{LoadCloud, SelectionOutcome, Selector, SuperpointSelector, VoxelSelector};
pub use settings::SelectorSettings;
pub use statistics::{CloudLabelStats, DatasetStatistics};
