//! Shared builders for alvox tests: cloud documents on disk, an in-memory
//! dataset, and deterministic segmentation models.
//!
//! Helpers panic on failure; they are only meant for tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use alvox_cloud::CloudDocument;
use alvox_core::errors::{InferenceError, LoadError};
use alvox_core::traits::{DatasetItem, SegmentationModel, SelectionDataset};
use alvox_core::CloudId;
use ndarray::{Array2, ArrayView2};
use tempfile::TempDir;

// ---- Cloud documents ----

/// Description of one synthetic cloud.
#[derive(Debug, Clone, Default)]
pub struct FixtureCloud {
    pub size: usize,
    pub labeled: Vec<u32>,
    pub superpoint_map: Option<Vec<u32>>,
    pub labels: Option<Vec<u32>>,
    /// Voxel centers. Defaults to voxel `i` at `(i, 0, 0)`.
    pub points: Option<Vec<[f32; 3]>>,
}

impl FixtureCloud {
    pub fn voxels(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn superpoints(superpoint_map: Vec<u32>) -> Self {
        Self {
            size: superpoint_map.len(),
            superpoint_map: Some(superpoint_map),
            ..Self::default()
        }
    }

    pub fn labeled(mut self, indices: &[u32]) -> Self {
        self.labeled = indices.to_vec();
        self
    }

    pub fn with_labels(mut self, labels: Vec<u32>) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_points(mut self, points: Vec<[f32; 3]>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn document(&self) -> CloudDocument {
        let mut mask = vec![false; self.size];
        for &i in &self.labeled {
            mask[i as usize] = true;
        }
        CloudDocument {
            points: Some(
                self.points
                    .clone()
                    .unwrap_or_else(|| (0..self.size).map(|i| [i as f32, 0.0, 0.0]).collect()),
            ),
            label_mask: Some(mask),
            predictions: None,
            labels: self.labels.clone(),
            superpoint_map: self.superpoint_map.clone(),
        }
    }
}

/// Write `cloud` as `<dir>/<name>.json`.
pub fn write_cloud(dir: &Path, name: &str, cloud: &FixtureCloud) -> PathBuf {
    let path = dir.join(format!("{name}.json"));
    cloud.document()
        .write(&path)
        .unwrap_or_else(|e| panic!("failed to write fixture cloud {}: {e}", path.display()));
    path
}

/// A temp directory holding one document per fixture, named `cloud_<i>.json`.
pub struct CloudDir {
    pub dir: TempDir,
    pub paths: Vec<PathBuf>,
}

impl CloudDir {
    pub fn new(fixtures: &[FixtureCloud]) -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("failed to create temp dir: {e}"));
        let paths = fixtures
            .iter()
            .enumerate()
            .map(|(i, cloud)| write_cloud(dir.path(), &format!("cloud_{i}"), cloud))
            .collect();
        Self { dir, paths }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

// ---- Dataset ----

/// A dataset with one point per voxel, split into items of at most
/// `points_per_item` points.
///
/// Point features are `[cloud_id, voxel]`, which lets the table models
/// below look up a per-voxel answer. Optional ignored points (voxel -1)
/// are appended to the last item of each cloud.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    files: Vec<PathBuf>,
    items: Vec<DatasetItem>,
    masks: Vec<Option<Vec<bool>>>,
    updates: usize,
}

impl InMemoryDataset {
    pub fn new(files: Vec<PathBuf>, sizes: &[usize]) -> Self {
        Self::chunked(files, sizes, usize::MAX, 0)
    }

    pub fn chunked(
        files: Vec<PathBuf>,
        sizes: &[usize],
        points_per_item: usize,
        ignored_per_cloud: usize,
    ) -> Self {
        let mut items = Vec::new();
        for (cloud, &size) in sizes.iter().enumerate() {
            let cloud_id = CloudId(cloud as u32);
            let mut voxels: Vec<i64> = (0..size as i64).collect();
            voxels.extend(std::iter::repeat(-1).take(ignored_per_cloud));
            let chunks: Vec<&[i64]> = voxels.chunks(points_per_item.max(1)).collect();
            let last = chunks.len().saturating_sub(1);
            for (i, chunk) in chunks.iter().enumerate() {
                let features = Array2::from_shape_fn((chunk.len(), 2), |(r, c)| {
                    if c == 0 {
                        cloud as f32
                    } else {
                        chunk[r] as f32
                    }
                });
                items.push(DatasetItem {
                    features,
                    voxel_map: chunk.to_vec(),
                    cloud_id,
                    end_of_cloud: i == last,
                });
            }
        }
        let masks = vec![None; files.len()];
        Self {
            files,
            items,
            masks,
            updates: 0,
        }
    }

    /// Last mask pushed for a cloud.
    pub fn mask(&self, cloud_id: CloudId) -> Option<&[bool]> {
        self.masks.get(cloud_id.index()).and_then(|m| m.as_deref())
    }

    /// Number of `update_label_mask` calls received.
    pub fn update_count(&self) -> usize {
        self.updates
    }
}

impl SelectionDataset for InMemoryDataset {
    fn cloud_files(&self) -> &[PathBuf] {
        &self.files
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn item(&self, index: usize) -> Result<DatasetItem, LoadError> {
        self.items
            .get(index)
            .cloned()
            .ok_or_else(|| LoadError::Malformed {
                path: PathBuf::from("<memory>"),
                message: format!("no item {index}"),
            })
    }

    fn update_label_mask(&mut self, cloud_id: CloudId, mask: &[bool]) {
        if let Some(slot) = self.masks.get_mut(cloud_id.index()) {
            *slot = Some(mask.to_vec());
        }
        self.updates += 1;
    }
}

// ---- Models ----

/// Returns fixed probabilities per `(cloud, voxel)` from a table; voxels
/// missing from the table get a uniform row.
#[derive(Debug, Default)]
pub struct TableModel {
    num_classes: usize,
    rows: std::collections::HashMap<(u32, u32), Vec<f32>>,
    calls: AtomicUsize,
}

impl TableModel {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            ..Self::default()
        }
    }

    pub fn with_row(mut self, cloud: u32, voxel: u32, row: Vec<f32>) -> Self {
        assert_eq!(row.len(), self.num_classes, "row width must match num_classes");
        self.rows.insert((cloud, voxel), row);
        self
    }

    /// Number of `forward` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl SegmentationModel for TableModel {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn forward(&self, features: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let uniform = vec![1.0 / self.num_classes as f32; self.num_classes];
        let mut out = Array2::zeros((features.nrows(), self.num_classes));
        for (r, point) in features.rows().into_iter().enumerate() {
            let key = (point[0] as u32, point[1] as u32);
            let row = self.rows.get(&key).unwrap_or(&uniform);
            for (c, &p) in row.iter().enumerate() {
                out[[r, c]] = p;
            }
        }
        Ok(out)
    }
}

/// Emits logits that make voxel `v` more uncertain the larger `v` is.
#[derive(Debug, Clone, Copy)]
pub struct RampModel;

impl SegmentationModel for RampModel {
    fn num_classes(&self) -> usize {
        2
    }

    fn forward(&self, features: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        Ok(Array2::from_shape_fn((features.nrows(), 2), |(r, c)| {
            if c == 0 {
                10.0 / (1.0 + features[[r, 1]])
            } else {
                0.0
            }
        }))
    }
}

/// Always fails.
#[derive(Debug, Clone, Copy)]
pub struct FailingModel;

impl SegmentationModel for FailingModel {
    fn num_classes(&self) -> usize {
        2
    }

    fn forward(&self, _features: ArrayView2<'_, f32>) -> Result<Array2<f32>, InferenceError> {
        Err(InferenceError::Failed {
            reason: "model unavailable".to_string(),
        })
    }
}
