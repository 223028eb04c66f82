//! A voxel cloud: coordinates, optional predictions, and the label mask.

use std::fmt;
use std::path::{Path, PathBuf};

use alvox_core::errors::{InvariantViolation, LoadError, MaskError};
use alvox_core::{CloudId, Granularity, UnitCandidate};
use ndarray::{Array2, ArrayView1};

use crate::document::CloudDocument;
use crate::units::{LabeledUnits, Selectable};

/// One point cloud at voxel granularity.
#[derive(Debug, Clone)]
pub struct Cloud {
    path: PathBuf,
    id: CloudId,
    /// `(size, 3)` voxel centers.
    points: Array2<f32>,
    /// `(size, classes)` mean class probabilities, once inference ran.
    predictions: Option<Array2<f32>>,
    labels: Option<Vec<u32>>,
    label_mask: Vec<bool>,
}

impl Cloud {
    /// Read a cloud document and validate its arrays against the mask length.
    pub fn load(path: &Path, id: CloudId) -> Result<Self, LoadError> {
        let document = CloudDocument::read(path)?;
        Self::from_document(path, id, document)
    }

    pub fn from_document(
        path: &Path,
        id: CloudId,
        document: CloudDocument,
    ) -> Result<Self, LoadError> {
        let label_mask = document.label_mask.ok_or_else(|| LoadError::MissingArray {
            path: path.to_path_buf(),
            array: "label_mask",
        })?;
        let raw_points = document.points.ok_or_else(|| LoadError::MissingArray {
            path: path.to_path_buf(),
            array: "points",
        })?;
        let size = label_mask.len();

        check_len(path, "points", size, raw_points.len())?;
        let points = Array2::from_shape_vec(
            (size, 3),
            raw_points.into_iter().flatten().collect(),
        )
        .map_err(|e| LoadError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let predictions = match document.predictions {
            Some(rows) if !rows.is_empty() || size == 0 => {
                check_len(path, "predictions", size, rows.len())?;
                Some(rows_to_array(path, "predictions", rows)?)
            }
            // An empty prediction list means inference has not run yet.
            _ => None,
        };

        if let Some(labels) = &document.labels {
            check_len(path, "labels", size, labels.len())?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            id,
            points,
            predictions,
            labels: document.labels,
            label_mask,
        })
    }

    /// Build a cloud in memory. `points` must have shape `(mask.len(), 3)`.
    pub fn from_parts(
        path: impl Into<PathBuf>,
        id: CloudId,
        points: Array2<f32>,
        label_mask: Vec<bool>,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        check_len(&path, "points", label_mask.len(), points.nrows())?;
        if points.ncols() != 3 {
            return Err(LoadError::RaggedArray {
                path,
                array: "points",
                row: 0,
                expected: 3,
                actual: points.ncols(),
            });
        }
        Ok(Self {
            path,
            id,
            points,
            predictions: None,
            labels: None,
            label_mask,
        })
    }

    /// Serialize back into a document, e.g. to write the merged mask.
    pub fn to_document(&self) -> CloudDocument {
        CloudDocument {
            points: Some(
                self.points
                    .rows()
                    .into_iter()
                    .map(|r| [r[0], r[1], r[2]])
                    .collect(),
            ),
            label_mask: Some(self.label_mask.clone()),
            predictions: self
                .predictions
                .as_ref()
                .map(|p| p.rows().into_iter().map(|r| r.to_vec()).collect()),
            labels: self.labels.clone(),
            superpoint_map: None,
        }
    }

    pub fn points(&self) -> &Array2<f32> {
        &self.points
    }

    pub fn predictions(&self) -> Option<&Array2<f32>> {
        self.predictions.as_ref()
    }

    /// Replace the per-voxel predictions. Rows must match the cloud size.
    pub fn set_predictions(&mut self, predictions: Array2<f32>) -> Result<(), InvariantViolation> {
        if predictions.nrows() != self.size() {
            return Err(InvariantViolation::LengthMismatch {
                cloud_id: self.id,
                what: "predictions",
                expected: self.size(),
                actual: predictions.nrows(),
            });
        }
        self.predictions = Some(predictions);
        Ok(())
    }

    pub fn clear_predictions(&mut self) {
        self.predictions = None;
    }

    pub fn labels(&self) -> Option<&[u32]> {
        self.labels.as_deref()
    }

    pub fn with_labels(mut self, labels: Vec<u32>) -> Result<Self, LoadError> {
        check_len(&self.path, "labels", self.size(), labels.len())?;
        self.labels = Some(labels);
        Ok(self)
    }

    pub fn num_classes(&self) -> usize {
        self.predictions.as_ref().map_or(0, |p| p.ncols())
    }

    /// Most likely class of a voxel's prediction, if it has a finite one.
    pub fn dominant_class(&self, voxel: usize) -> Option<u32> {
        self.predictions
            .as_ref()
            .and_then(|p| argmax(p.row(voxel)))
    }

    pub fn centroid(&self, voxel: usize) -> [f32; 3] {
        let row = self.points.row(voxel);
        [row[0], row[1], row[2]]
    }

    fn voxel_candidate(&self, voxel: usize, score: f32) -> UnitCandidate {
        UnitCandidate {
            cloud_id: self.id,
            unit: voxel as u32,
            score,
            voxel_count: 1,
            centroid: self.centroid(voxel),
            dominant_class: self.dominant_class(voxel),
        }
    }
}

impl LabeledUnits for Cloud {
    fn id(&self) -> CloudId {
        self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> usize {
        self.label_mask.len()
    }

    fn label_mask(&self) -> &[bool] {
        &self.label_mask
    }

    fn update_label_mask(&mut self, indices: &[u32]) -> Result<usize, MaskError> {
        let size = self.size();
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= size) {
            return Err(MaskError::IndexOutOfRange {
                cloud_id: self.id,
                index: bad as usize,
                size,
            });
        }

        let mut newly_labeled = 0;
        for &i in indices {
            let slot = &mut self.label_mask[i as usize];
            if !*slot {
                *slot = true;
                newly_labeled += 1;
            }
        }
        Ok(newly_labeled)
    }
}

impl Selectable for Cloud {
    const GRANULARITY: Granularity = Granularity::Voxels;

    fn eligible_units(&self) -> Vec<UnitCandidate> {
        self.label_mask
            .iter()
            .enumerate()
            .filter(|(_, labeled)| !**labeled)
            .map(|(voxel, _)| self.voxel_candidate(voxel, 0.0))
            .collect()
    }

    fn scored_units(&self, voxel_scores: &[f32]) -> Result<Vec<UnitCandidate>, InvariantViolation> {
        if voxel_scores.len() != self.size() {
            return Err(InvariantViolation::LengthMismatch {
                cloud_id: self.id,
                what: "voxel_scores",
                expected: self.size(),
                actual: voxel_scores.len(),
            });
        }
        Ok(self
            .label_mask
            .iter()
            .zip(voxel_scores)
            .enumerate()
            .filter(|(_, (labeled, score))| !**labeled && score.is_finite())
            .map(|(voxel, (_, &score))| self.voxel_candidate(voxel, score))
            .collect())
    }

    fn unit_voxels(&self, unit: u32) -> Vec<u32> {
        match self.label_mask.get(unit as usize) {
            Some(false) => vec![unit],
            _ => Vec::new(),
        }
    }

    fn unit_count(&self) -> usize {
        self.size()
    }

    fn base(&self) -> &Cloud {
        self
    }

    fn set_predictions(&mut self, predictions: Array2<f32>) -> Result<(), InvariantViolation> {
        Cloud::set_predictions(self, predictions)
    }

    fn clear_predictions(&mut self) {
        Cloud::clear_predictions(self)
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cloud {} ({})", self.id, self.path.display())?;
        writeln!(f, "  voxels: {}", self.size())?;
        if self.num_classes() > 0 {
            writeln!(f, "  classes: {}", self.num_classes())?;
        }
        write!(f, "  labeled: {:.2}%", self.labeled_ratio() * 100.0)
    }
}

/// Index of the largest entry; `None` for empty or non-finite rows.
pub(crate) fn argmax(row: ArrayView1<'_, f32>) -> Option<u32> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in row.iter().enumerate() {
        if !v.is_finite() {
            return None;
        }
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i as u32)
}

fn check_len(path: &Path, array: &'static str, expected: usize, actual: usize) -> Result<(), LoadError> {
    if expected != actual {
        return Err(LoadError::SizeMismatch {
            path: path.to_path_buf(),
            array,
            expected,
            actual,
        });
    }
    Ok(())
}

fn rows_to_array(path: &Path, array: &'static str, rows: Vec<Vec<f32>>) -> Result<Array2<f32>, LoadError> {
    let width = rows.first().map_or(0, Vec::len);
    let height = rows.len();
    let mut flat = Vec::with_capacity(width * height);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != width {
            return Err(LoadError::RaggedArray {
                path: path.to_path_buf(),
                array,
                row,
                expected: width,
                actual: values.len(),
            });
        }
        flat.extend(values);
    }
    Array2::from_shape_vec((height, width), flat).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
