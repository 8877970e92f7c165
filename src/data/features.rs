// ============================================================
// Layer 4 — Feature Stores
// ============================================================
// Concrete FeatureProvider implementations.
//
//   InMemoryFeatureStore — features registered per slot up front;
//                          applies the provider config on read
//   NoFeatures           — for question-only inspection runs
//
// The on-disk feature layout is owned by whoever fills the
// store; this module only applies channel ordering, the box
// cap, the width check and the info toggle.

use std::collections::HashMap;

use crate::data::config::FeatureProviderConfig;
use crate::domain::features::{feature_key, info_key, FeatureSet, FeatureTensor, ImageInfo};
use crate::domain::traits::FeatureProvider;
use crate::error::{Result, VqaError};

#[derive(Debug, Clone, Default)]
struct SlotFeatures {
    tensors: Vec<FeatureTensor>,
    info: Option<ImageInfo>,
}

#[derive(Debug, Clone)]
pub struct InMemoryFeatureStore {
    config: FeatureProviderConfig,
    slots: HashMap<usize, SlotFeatures>,
}

impl InMemoryFeatureStore {
    pub fn new(config: FeatureProviderConfig) -> Self {
        Self { config, slots: HashMap::new() }
    }

    pub fn config(&self) -> &FeatureProviderConfig {
        &self.config
    }

    /// Register the feature tensors of one slot, in positional order.
    pub fn insert(&mut self, slot: usize, tensors: Vec<FeatureTensor>, info: Option<ImageInfo>) {
        self.slots.insert(slot, SlotFeatures { tensors, info });
    }

    fn prepare(&self, tensor: &FeatureTensor) -> Result<FeatureTensor> {
        // Stored layout is [boxes, dim]; depth-first callers want [dim, boxes].
        let mut tensor = match self.config.max_bboxes {
            Some(max) => tensor.truncate_rows(max),
            None => tensor.clone(),
        };
        if let Some(ndim) = self.config.ndim {
            if tensor.cols() != ndim {
                return Err(VqaError::format(format!(
                    "feature width {} does not match ndim {ndim}",
                    tensor.cols()
                )));
            }
        }
        if self.config.channel_first {
            tensor = tensor.transpose();
        }
        Ok(tensor)
    }
}

impl FeatureProvider for InMemoryFeatureStore {
    fn get(&self, slot: usize) -> Result<FeatureSet> {
        let Some(stored) = self.slots.get(&slot) else {
            tracing::debug!("No features registered for slot {}", slot);
            return Ok(FeatureSet::default());
        };

        let mut set = FeatureSet::default();
        for (position, tensor) in stored.tensors.iter().enumerate() {
            set.features.insert(feature_key(position), self.prepare(tensor)?);
        }

        if self.config.return_info {
            if let Some(info) = &stored.info {
                let mut info = info.clone();
                if let (Some(max), Some(boxes)) = (self.config.max_bboxes, info.bboxes.as_mut()) {
                    boxes.truncate(max);
                }
                set.info.insert(info_key(0), info);
            }
        }

        Ok(set)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeatures;

impl FeatureProvider for NoFeatures {
    fn get(&self, _slot: usize) -> Result<FeatureSet> {
        Ok(FeatureSet::default())
    }
}
