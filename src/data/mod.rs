// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from an annotation index on
// disk all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   imdb .json
//       │
//       ▼
//   JsonAnnotationIndex → header version + one record per slot
//       │
//       ▼
//   FeatureProvider     → image features for the same slot
//       │
//       ▼
//   ExampleEncoder      → question ids, answer targets, layout
//       │
//       ▼
//   VqaDataset          → implements Burn's Dataset trait
//       │
//       ▼
//   VqaBatcher          → stacks samples into tensor batches
//
// Several datasets sharing vocabularies can be served as one
// through ConcatenatedDatasetView.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Token ↔ id tables loaded from one-token-per-line files
pub mod vocab;

/// Answer string normalisation before vocabulary lookup
pub mod answer_norm;

/// Soft answer scores from multiple human annotations
pub mod answer_scorer;

/// Layout module pruning and the module-vocabulary assembler
pub mod layout;

/// Serde-readable dataset configuration
pub mod config;

/// JSON annotation index
pub mod imdb;

/// In-memory feature backend
pub mod features;

/// Record → Sample encoding
pub mod encoder;

/// Dataset metadata shared by single and concatenated datasets
pub mod source;

/// Implements Burn's Dataset trait for VQA samples
pub mod dataset;

/// Several datasets behind one index range
pub mod concat;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

#[cfg(test)]
pub(crate) mod test_support;
