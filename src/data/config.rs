// ============================================================
// Layer 4 — Dataset Configuration
// ============================================================
// A flat, serde-readable description of one dataset. Key names
// follow the established annotation tooling (T_encoder,
// image_depth_first, ...) so existing JSON configs load as-is.
//
// DatasetConfig is validated once and split into:
//   - FeatureProviderConfig → handed to the feature backend
//   - the encoder settings  → see data::encoder::EncoderConfig

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, VqaError};

fn default_name() -> String {
    "vqa2".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Registry key; also selects per-dataset answer handling.
    #[serde(default = "default_name")]
    pub name: String,

    /// Annotation index, relative to `data_root_dir`.
    pub imdb_file: PathBuf,

    /// Base directory every relative path is resolved against.
    pub data_root_dir: PathBuf,

    /// Answer vocabulary, relative to `data_root_dir`.
    pub vocab_answer: PathBuf,

    /// Question vocabulary, relative to `data_root_dir`.
    pub vocab_question: PathBuf,

    /// Feature arrays are stored channel-first.
    #[serde(default)]
    pub image_depth_first: bool,

    /// Cap on feature rows (bounding boxes) kept per image.
    #[serde(default)]
    pub image_max_loc: Option<usize>,

    /// Encoded question length.
    #[serde(rename = "T_encoder")]
    pub t_encoder: usize,

    /// Layout length; required when `load_gt_layout` is set.
    #[serde(rename = "T_decoder", default)]
    pub t_decoder: Option<usize>,

    /// Encode ground-truth module layouts into every sample.
    #[serde(default)]
    pub load_gt_layout: bool,

    /// Module vocabulary for the layout assembler, relative to `data_root_dir`.
    #[serde(default)]
    pub assembler: Option<PathBuf>,

    /// Collapse redundant `_Filter` steps before assembling layouts.
    #[serde(default)]
    pub prune_filter_module: bool,

    /// Build answer targets; off for unlabelled test splits.
    #[serde(default = "default_true")]
    pub load_answer: bool,

    /// Split tag forwarded to the feature backend (train, val, test).
    pub dataset_type: String,

    /// Encode every sample once at construction and serve from memory.
    #[serde(default)]
    pub fast_read: bool,

    /// Expected feature rank, forwarded to the feature backend.
    #[serde(default)]
    pub ndim: Option<usize>,

    /// Also return image size and bounding boxes with each sample.
    #[serde(default)]
    pub return_info: bool,
}

/// Settings forwarded to whatever backs the image features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureProviderConfig {
    pub channel_first: bool,
    pub max_bboxes: Option<usize>,
    pub ndim: Option<usize>,
    pub dataset_type: String,
    pub fast_read: bool,
    pub return_info: bool,
}

/// Layout settings that only exist once `load_gt_layout` is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutSettings {
    pub t_decoder: usize,
    pub assembler: PathBuf,
    pub prune_filter_module: bool,
}

impl DatasetConfig {
    /// Minimal config for the given root and file names; everything
    /// optional is left at its default.
    pub fn new(
        data_root_dir: impl Into<PathBuf>,
        imdb_file: impl Into<PathBuf>,
        vocab_question: impl Into<PathBuf>,
        vocab_answer: impl Into<PathBuf>,
        t_encoder: usize,
    ) -> Self {
        Self {
            name: default_name(),
            imdb_file: imdb_file.into(),
            data_root_dir: data_root_dir.into(),
            vocab_answer: vocab_answer.into(),
            vocab_question: vocab_question.into(),
            image_depth_first: false,
            image_max_loc: None,
            t_encoder,
            t_decoder: None,
            load_gt_layout: false,
            assembler: None,
            prune_filter_module: false,
            load_answer: true,
            dataset_type: "train".to_string(),
            fast_read: false,
            ndim: None,
            return_info: false,
        }
    }

    pub fn resolve(&self, relative: impl AsRef<std::path::Path>) -> PathBuf {
        self.data_root_dir.join(relative)
    }

    pub fn feature_config(&self) -> FeatureProviderConfig {
        FeatureProviderConfig {
            channel_first: self.image_depth_first,
            max_bboxes: self.image_max_loc,
            ndim: self.ndim,
            dataset_type: self.dataset_type.clone(),
            fast_read: self.fast_read,
            return_info: self.return_info,
        }
    }

    /// None when layout loading is off; ConfigError when it is on but
    /// `T_decoder` or `assembler` is missing.
    pub fn layout_settings(&self) -> Result<Option<LayoutSettings>> {
        if !self.load_gt_layout {
            return Ok(None);
        }
        let t_decoder = self
            .t_decoder
            .ok_or_else(|| VqaError::config("load_gt_layout requires T_decoder"))?;
        let assembler = self
            .assembler
            .clone()
            .ok_or_else(|| VqaError::config("load_gt_layout requires an assembler"))?;
        Ok(Some(LayoutSettings {
            t_decoder,
            assembler: self.resolve(assembler),
            prune_filter_module: self.prune_filter_module,
        }))
    }

    pub fn validate(&self) -> Result<()> {
        if self.t_encoder == 0 {
            return Err(VqaError::config("T_encoder must be positive"));
        }
        self.layout_settings().map(|_| ())
    }
}
