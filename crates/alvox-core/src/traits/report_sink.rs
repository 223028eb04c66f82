//! Reporting collaborator.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single reported statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    Count(u64),
    Scalar(f64),
    Array(Vec<f64>),
    Text(String),
}

/// Stat name to value.
pub type Report = BTreeMap<String, ReportValue>;

/// Sink for summary statistics (experiment tracker, log file, test buffer).
pub trait ReportSink: Send + Sync {
    fn emit(&self, name: &str, report: &Report);
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl ReportSink for NoOpSink {
    fn emit(&self, _name: &str, _report: &Report) {}
}

impl<T: ReportSink + ?Sized> ReportSink for std::sync::Arc<T> {
    fn emit(&self, name: &str, report: &Report) {
        (**self).emit(name, report)
    }
}
