// ============================================================
// Layer 3 — Image Feature Types
// ============================================================
// What a FeatureProvider hands back for one annotation slot.
// Tensors are keyed positionally ("image_feature_0",
// "image_feature_1", ...) and box metadata lives under
// "image_info_0". The encoder walks the positional keys and
// stops at the first gap.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A dense row-major 2D feature block, e.g. [num_boxes, feature_dim].
/// Only `new` builds one, so `data` always fills `shape` exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTensor {
    shape: [usize; 2],
    data: Vec<f32>,
}

impl FeatureTensor {
    /// Returns None when `data` does not fill `shape` exactly.
    pub fn new(shape: [usize; 2], data: Vec<f32>) -> Option<Self> {
        (shape[0] * shape[1] == data.len()).then_some(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    pub fn transpose(&self) -> Self {
        let [rows, cols] = self.shape;
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..cols {
            for r in 0..rows {
                data.push(self.data[r * cols + c]);
            }
        }
        Self { shape: [cols, rows], data }
    }

    /// Keep at most `max_rows` rows.
    pub fn truncate_rows(&self, max_rows: usize) -> Self {
        let rows = self.rows().min(max_rows);
        Self {
            shape: [rows, self.cols()],
            data: self.data[..rows * self.cols()].to_vec(),
        }
    }
}

/// Bounding-box metadata for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub max_bboxes: Option<usize>,
    #[serde(default)]
    pub bboxes: Option<Vec<[f32; 4]>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub features: HashMap<String, FeatureTensor>,
    pub info: HashMap<String, ImageInfo>,
}

pub fn feature_key(position: usize) -> String {
    format!("image_feature_{position}")
}

pub fn info_key(position: usize) -> String {
    format!("image_info_{position}")
}

impl FeatureSet {
    /// Feature tensors in positional order, stopping at the first missing key.
    pub fn ordered_features(&self) -> Vec<FeatureTensor> {
        (0..)
            .map_while(|position| self.features.get(&feature_key(position)).cloned())
            .collect()
    }

    pub fn primary_info(&self) -> Option<&ImageInfo> {
        self.info.get(&info_key(0))
    }
}
