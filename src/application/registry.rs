// ============================================================
// Layer 2 — Dataset Registry
// ============================================================
// Maps a dataset name from the config to the constructor that
// builds it. Every constructor shares one feature factory, so
// the feature backend is chosen once per run.
//
//   "vqa2" | "textvqa" | "vizwiz"  →  VqaDataset::open
//
// Per-dataset answer handling (the TextVQA answer window, for
// instance) keys off the same name inside the encoder.

use std::collections::BTreeMap;

use crate::data::{
    concat::ConcatenatedDatasetView,
    config::{DatasetConfig, FeatureProviderConfig},
    dataset::VqaDataset,
    features::InMemoryFeatureStore,
};
use crate::domain::traits::FeatureProvider;
use crate::error::{Result, VqaError};

pub type FeatureFactory = dyn Fn(FeatureProviderConfig) -> Result<Box<dyn FeatureProvider>> + Send + Sync;

pub type DatasetConstructor = fn(&DatasetConfig, &FeatureFactory) -> Result<VqaDataset>;

fn open_vqa(config: &DatasetConfig, features: &FeatureFactory) -> Result<VqaDataset> {
    VqaDataset::open(config, |cfg| features(cfg))
}

pub struct DatasetRegistry {
    constructors: BTreeMap<String, DatasetConstructor>,
    features: Box<FeatureFactory>,
}

impl Default for DatasetRegistry {
    /// The VQA family, backed by an empty in-memory feature store.
    fn default() -> Self {
        Self::with_features(Box::new(|cfg: FeatureProviderConfig| {
            Ok(Box::new(InMemoryFeatureStore::new(cfg)) as Box<dyn FeatureProvider>)
        }))
    }
}

impl DatasetRegistry {
    pub fn with_features(features: Box<FeatureFactory>) -> Self {
        let mut registry = Self { constructors: BTreeMap::new(), features };
        for name in ["vqa2", "textvqa", "vizwiz"] {
            registry.register(name, open_vqa);
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: DatasetConstructor) {
        self.constructors.insert(name.into(), constructor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn build(&self, config: &DatasetConfig) -> Result<VqaDataset> {
        let constructor = self.constructors.get(&config.name).ok_or_else(|| {
            VqaError::config(format!(
                "unknown dataset '{}' (known: {})",
                config.name,
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })?;
        tracing::info!("Building dataset '{}'", config.name);
        constructor(config, self.features.as_ref())
    }

    pub fn build_all(&self, configs: &[DatasetConfig]) -> Result<ConcatenatedDatasetView> {
        let datasets = configs
            .iter()
            .map(|config| self.build(config))
            .collect::<Result<Vec<_>>>()?;
        ConcatenatedDatasetView::new(datasets)
    }
}
