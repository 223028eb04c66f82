//! Collaborator interfaces injected into the selection engine.

pub mod dataset;
pub mod mask_store;
pub mod model;
pub mod report_sink;

pub use dataset::{DatasetItem, SelectionDataset};
pub use mask_store::{CloudMaskRecord, MaskStore, RoundRecord};
pub use model::SegmentationModel;
pub use report_sink::{NoOpSink, Report, ReportSink, ReportValue};
