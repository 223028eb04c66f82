//! Dataset-wide labeling statistics.

use std::collections::BTreeMap;

use alvox_cloud::{Cloud, LabeledUnits};
use alvox_core::constants::LABEL_RATIO_TOLERANCE;
use alvox_core::errors::InvariantViolation;
use alvox_core::traits::{Report, ReportValue};
use alvox_core::CloudId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudLabelStats {
    pub cloud_id: CloudId,
    pub size: usize,
    pub labeled: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStatistics {
    pub total_voxels: usize,
    pub labeled_voxels: usize,
    pub labeled_ratio: f64,
    pub clouds: Vec<CloudLabelStats>,
    /// Labeled voxels per ground-truth class, over clouds that carry labels.
    pub class_distribution: Option<BTreeMap<u32, u64>>,
    /// Cloud with the highest labeled ratio; the lowest id wins ties.
    pub most_labeled: Option<CloudId>,
}

impl DatasetStatistics {
    pub fn compute<'a>(clouds: impl IntoIterator<Item = &'a Cloud>) -> Self {
        let mut stats = Self::default();
        let mut distribution: Option<BTreeMap<u32, u64>> = None;

        for cloud in clouds {
            let labeled = cloud.labeled_count();
            stats.total_voxels += cloud.size();
            stats.labeled_voxels += labeled;
            stats.clouds.push(CloudLabelStats {
                cloud_id: cloud.id(),
                size: cloud.size(),
                labeled,
                ratio: cloud.labeled_ratio(),
            });

            if let Some(labels) = cloud.labels() {
                let counts = distribution.get_or_insert_with(BTreeMap::new);
                for (&class, _) in labels
                    .iter()
                    .zip(cloud.label_mask())
                    .filter(|(_, labeled)| **labeled)
                {
                    *counts.entry(class).or_insert(0) += 1;
                }
            }
        }

        stats.labeled_ratio = if stats.total_voxels == 0 {
            1.0
        } else {
            stats.labeled_voxels as f64 / stats.total_voxels as f64
        };
        stats.class_distribution = distribution;
        stats.most_labeled = stats
            .clouds
            .iter()
            .fold(None::<&CloudLabelStats>, |best, c| match best {
                Some(b) if b.ratio >= c.ratio => Some(b),
                _ => Some(c),
            })
            .map(|c| c.cloud_id);
        stats
    }

    /// Fails unless every voxel of every cloud is labeled.
    pub fn ensure_fully_labeled(&self) -> Result<(), InvariantViolation> {
        if (self.labeled_ratio - 1.0).abs() > LABEL_RATIO_TOLERANCE {
            return Err(InvariantViolation::LabelRatio {
                expected: 1.0,
                actual: self.labeled_ratio,
                tolerance: LABEL_RATIO_TOLERANCE,
            });
        }
        Ok(())
    }

    pub fn to_report(&self) -> Report {
        let mut report = Report::new();
        report.insert("total_voxels".into(), ReportValue::Count(self.total_voxels as u64));
        report.insert("labeled_voxels".into(), ReportValue::Count(self.labeled_voxels as u64));
        report.insert("labeled_ratio".into(), ReportValue::Scalar(self.labeled_ratio));
        report.insert(
            "cloud_ratios".into(),
            ReportValue::Array(self.clouds.iter().map(|c| c.ratio).collect()),
        );
        if let Some(id) = self.most_labeled {
            report.insert("most_labeled_cloud".into(), ReportValue::Count(u64::from(id.0)));
        }
        if let Some(distribution) = &self.class_distribution {
            for (class, count) in distribution {
                report.insert(format!("class_{class}.labeled"), ReportValue::Count(*count));
            }
        }
        report
    }
}
