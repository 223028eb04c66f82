//! Round orchestration: restore, select, merge, persist, report.

use std::time::Instant;

use alvox_core::errors::{MergeOutcome, SelectionError};
use alvox_core::traits::{
    MaskStore, Report, ReportSink, ReportValue, RoundRecord, SegmentationModel, SelectionDataset,
};
use alvox_core::{AlvoxConfig, Criterion};
use alvox_metrics::MetricStatistics;

use crate::any::AnySelector;

/// What one round did.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub round: u32,
    pub criterion: Criterion,
    pub eligible_units: usize,
    pub selected_units: usize,
    pub selected_voxels: usize,
    pub labeled_ratio: f64,
    pub finished: bool,
    pub merge: MergeOutcome,
    pub unweighted: Option<MetricStatistics>,
    pub weighted: Option<MetricStatistics>,
}

impl RoundSummary {
    pub fn to_report(&self) -> Report {
        let mut report = Report::new();
        report.insert("round".into(), ReportValue::Count(u64::from(self.round)));
        report.insert("criterion".into(), ReportValue::Text(self.criterion.to_string()));
        report.insert("eligible_units".into(), ReportValue::Count(self.eligible_units as u64));
        report.insert("selected_units".into(), ReportValue::Count(self.selected_units as u64));
        report.insert("selected_voxels".into(), ReportValue::Count(self.selected_voxels as u64));
        report.insert("newly_labeled".into(), ReportValue::Count(self.merge.newly_labeled as u64));
        report.insert("labeled_ratio".into(), ReportValue::Scalar(self.labeled_ratio));
        report.insert("merge_errors".into(), ReportValue::Count(self.merge.error_count() as u64));
        report
    }
}

/// Drives selection rounds against a persistent mask store.
pub struct SelectionEngine<S> {
    selector: AnySelector,
    store: S,
    sink: Box<dyn ReportSink>,
    initial_random: bool,
    restored: bool,
}

impl<S: MaskStore> SelectionEngine<S> {
    /// Rounds select `selector.settings().percentage` of the eligible pool.
    pub fn new(
        selector: AnySelector,
        store: S,
        sink: Box<dyn ReportSink>,
        config: &AlvoxConfig,
    ) -> Self {
        Self {
            selector,
            store,
            sink,
            initial_random: config.selection.effective_initial_random(),
            restored: false,
        }
    }

    pub fn selector(&self) -> &AnySelector {
        &self.selector
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_finished(&self) -> bool {
        self.selector.is_finished()
    }

    /// Apply persisted masks to the loaded clouds and push them to the
    /// dataset. Runs once; later calls are no-ops.
    pub fn restore(&mut self, dataset: &mut dyn SelectionDataset) -> Result<MergeOutcome, SelectionError> {
        if self.restored {
            return Ok(MergeOutcome::default());
        }
        let records = self.store.load_masks()?;
        let outcome = self.selector.restore_masks(&records, dataset);
        for error in &outcome.errors {
            tracing::warn!(error = %error, "persisted mask not restored");
        }
        tracing::info!(
            clouds = outcome.merged_clouds.len(),
            labeled_ratio = self.selector.labeled_ratio(),
            "restored persisted masks"
        );
        self.restored = true;
        Ok(outcome)
    }

    /// Run one full round. The first round uses the random criterion when
    /// `initial_random` is set, so no model is needed to bootstrap.
    pub fn run_round(
        &mut self,
        dataset: &mut dyn SelectionDataset,
        model: Option<&dyn SegmentationModel>,
    ) -> Result<RoundSummary, SelectionError> {
        self.restore(dataset)?;

        let latest = self.store.latest_round()?;
        let round = latest.map_or(1, |r| r + 1);
        let criterion = if latest.is_none() && self.initial_random {
            Criterion::Random
        } else {
            self.selector.settings().criterion
        };

        let percentage = self.selector.settings().percentage;
        let span = alvox_core::round_span!(round, criterion, self.selector.granularity());
        let _guard = span.enter();

        let outcome = self
            .selector
            .select_with_criterion(criterion, &*dataset, model, percentage)?;
        let merge = self.selector.load_voxel_selection(&outcome.selection, dataset);
        let labeled_ratio = self.selector.labeled_ratio();

        let record = RoundRecord {
            round,
            criterion,
            granularity: self.selector.granularity(),
            percentage,
            selection: outcome.selection.clone(),
            masks: self.selector.masks(),
            labeled_ratio,
            metric_statistics: outcome.statistics_json(),
        };
        let started = Instant::now();
        self.store.record_round(&record)?;
        tracing::debug!(persist_time_ms = started.elapsed().as_millis() as u64, "round persisted");

        let summary = RoundSummary {
            round,
            criterion,
            eligible_units: outcome.eligible_units,
            selected_units: outcome.selected_units,
            selected_voxels: outcome.selection.total_units(),
            labeled_ratio,
            finished: self.selector.is_finished(),
            merge,
            unweighted: outcome.unweighted,
            weighted: outcome.weighted,
        };

        self.sink.emit("selection_round", &summary.to_report());
        for stats in [&summary.unweighted, &summary.weighted].into_iter().flatten() {
            self.sink
                .emit(&format!("metric_statistics.{}", stats.kind()), &stats.to_report());
        }
        self.sink
            .emit("dataset_statistics", &self.selector.statistics().to_report());

        tracing::info!(
            round,
            selected_units = summary.selected_units,
            selected_voxels = summary.selected_voxels,
            labeled_ratio,
            finished = summary.finished,
            "selection round complete"
        );
        Ok(summary)
    }

    /// Run rounds until the selector reports finished or `max_rounds` ran.
    pub fn run_until_finished(
        &mut self,
        dataset: &mut dyn SelectionDataset,
        model: Option<&dyn SegmentationModel>,
        max_rounds: usize,
    ) -> Result<Vec<RoundSummary>, SelectionError> {
        self.restore(dataset)?;
        let mut summaries = Vec::new();
        while summaries.len() < max_rounds && !self.is_finished() {
            let summary = self.run_round(dataset, model)?;
            let stalled = summary.selected_units == 0;
            summaries.push(summary);
            if stalled {
                tracing::warn!("round selected nothing, stopping");
                break;
            }
        }
        Ok(summaries)
    }
}
