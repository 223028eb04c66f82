//! `ReportSink` implementations.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use alvox_core::traits::{Report, ReportSink};
use serde::Serialize;

/// Emits every report as a structured `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, name: &str, report: &Report) {
        let body = serde_json::to_string(report).unwrap_or_default();
        tracing::info!(report = name, stats = %body, "selection report");
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<(String, Report)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, Report)> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Reports with the given name, oldest first.
    pub fn named(&self, name: &str) -> Vec<Report> {
        self.reports()
            .into_iter()
            .filter(|(n, _)| n == name)
            .map(|(_, r)| r)
            .collect()
    }
}

impl ReportSink for MemorySink {
    fn emit(&self, name: &str, report: &Report) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((name.to_string(), report.clone()));
        }
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    name: &'a str,
    stats: &'a Report,
}

/// Appends one JSON object per report to a file.
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl ReportSink for JsonLinesSink {
    fn emit(&self, name: &str, report: &Report) {
        let line = JsonLine { name, stats: report };
        let Ok(mut writer) = self.writer.lock() else {
            tracing::warn!(report = name, "report writer lock poisoned");
            return;
        };
        let written = serde_json::to_writer(&mut *writer, &line)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());
        if let Err(e) = written {
            tracing::warn!(report = name, error = %e, "failed to write report");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alvox_core::traits::ReportValue;

    fn report() -> Report {
        let mut r = Report::new();
        r.insert("selected".into(), ReportValue::Count(3));
        r.insert("ratio".into(), ReportValue::Scalar(0.25));
        r
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit("a", &report());
        sink.emit("b", &Report::new());
        sink.emit("a", &Report::new());
        assert_eq!(sink.reports().len(), 3);
        assert_eq!(sink.named("a").len(), 2);
        assert_eq!(sink.named("a")[0].get("selected"), Some(&ReportValue::Count(3)));
    }

    #[test]
    fn json_lines_appends_one_object_per_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.jsonl");
        let sink = JsonLinesSink::create(&path).unwrap();
        sink.emit("round", &report());
        sink.emit("round", &report());

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["name"], "round");
        assert_eq!(lines[0]["stats"]["selected"], 3);
        assert_eq!(lines[1]["stats"]["ratio"], 0.25);
    }
}
