//! Score distribution summaries for reporting.

use alvox_core::traits::{Report, ReportValue};
use alvox_core::Criterion;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics, Statistics};

/// Summary of a set of scores. Quartiles use the R-8 estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ScoreSummary {
    /// `None` when no finite score is present.
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        let values: Vec<f64> = scores
            .iter()
            .filter(|s| s.is_finite())
            .map(|&s| f64::from(s))
            .collect();
        if values.is_empty() {
            return None;
        }

        let mut data = Data::new(values.clone());
        Some(Self {
            count: values.len(),
            mean: Statistics::mean(&values),
            std_dev: Statistics::population_std_dev(&values),
            min: Statistics::min(&values),
            q25: data.lower_quartile(),
            median: data.median(),
            q75: data.upper_quartile(),
            max: Statistics::max(&values),
        })
    }

    fn extend_report(&self, prefix: &str, report: &mut Report) {
        let mut put = |key: &str, value: ReportValue| {
            report.insert(format!("{prefix}.{key}"), value);
        };
        put("count", ReportValue::Count(self.count as u64));
        put("mean", ReportValue::Scalar(self.mean));
        put("std", ReportValue::Scalar(self.std_dev));
        put("min", ReportValue::Scalar(self.min));
        put("q25", ReportValue::Scalar(self.q25));
        put("median", ReportValue::Scalar(self.median));
        put("q75", ReportValue::Scalar(self.q75));
        put("max", ReportValue::Scalar(self.max));
    }
}

/// Scores of selected vs. non-selected eligible units in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub criterion: Criterion,
    /// Whether the scores were diversity-weighted.
    pub weighted: bool,
    pub selected: Option<ScoreSummary>,
    pub unselected: Option<ScoreSummary>,
}

impl MetricStatistics {
    /// Split `scores` by the parallel `selected` flags and summarize both sides.
    pub fn compute(criterion: Criterion, weighted: bool, scores: &[f32], selected: &[bool]) -> Self {
        let (picked, rest): (Vec<_>, Vec<_>) = scores
            .iter()
            .zip(selected)
            .partition(|(_, &is_selected)| is_selected);
        let picked: Vec<f32> = picked.into_iter().map(|(&s, _)| s).collect();
        let rest: Vec<f32> = rest.into_iter().map(|(&s, _)| s).collect();

        Self {
            criterion,
            weighted,
            selected: ScoreSummary::from_scores(&picked),
            unselected: ScoreSummary::from_scores(&rest),
        }
    }

    /// `unweighted` or `weighted`.
    pub fn kind(&self) -> &'static str {
        if self.weighted {
            "weighted"
        } else {
            "unweighted"
        }
    }

    pub fn to_report(&self) -> Report {
        let mut report = Report::new();
        report.insert(
            "criterion".to_string(),
            ReportValue::Text(self.criterion.to_string()),
        );
        report.insert("kind".to_string(), ReportValue::Text(self.kind().to_string()));
        if let Some(summary) = &self.selected {
            summary.extend_report("selected", &mut report);
        }
        if let Some(summary) = &self.unselected {
            summary.extend_report("unselected", &mut report);
        }
        report
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_simple_scores() {
        let s = ScoreSummary::from_scores(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.count, 5);
        assert!((s.mean - 3.0).abs() < 1e-12);
        assert!((s.std_dev - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.max, 5.0);
        assert!(s.min <= s.q25 && s.q25 <= s.median && s.median <= s.q75 && s.q75 <= s.max);
    }

    #[test]
    fn nan_scores_are_ignored() {
        let s = ScoreSummary::from_scores(&[f32::NAN, 2.0]).unwrap();
        assert_eq!(s.count, 1);
        assert!(ScoreSummary::from_scores(&[f32::NAN]).is_none());
        assert!(ScoreSummary::from_scores(&[]).is_none());
    }

    #[test]
    fn compute_splits_by_selection() {
        let stats = MetricStatistics::compute(
            Criterion::EntropyUncertainty,
            false,
            &[0.9, 0.1, 0.8, 0.2],
            &[true, false, true, false],
        );
        let selected = stats.selected.unwrap();
        let unselected = stats.unselected.unwrap();
        assert_eq!(selected.count, 2);
        assert!(selected.mean > unselected.mean);
        assert_eq!(stats.kind(), "unweighted");
    }

    #[test]
    fn report_is_keyed_by_side() {
        let stats = MetricStatistics::compute(Criterion::LeastConfidence, true, &[0.5], &[true]);
        let report = stats.to_report();
        assert_eq!(report.get("selected.count"), Some(&ReportValue::Count(1)));
        assert_eq!(report.get("kind"), Some(&ReportValue::Text("weighted".into())));
        assert!(!report.contains_key("unselected.count"));
    }

    #[test]
    fn json_roundtrip() {
        let stats = MetricStatistics::compute(Criterion::MarginUncertainty, false, &[0.1, 0.4], &[false, true]);
        let back: MetricStatistics = serde_json::from_value(stats.to_json()).unwrap();
        assert_eq!(back, stats);
    }
}
