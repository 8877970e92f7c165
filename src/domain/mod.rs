// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// pipeline works with: annotation records going in, samples
// coming out, and the collaborator seams in between.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only data shapes and traits

/// One raw question/image record from the annotation index
pub mod annotation;

/// Image feature tensors and box metadata handed over by a FeatureProvider
pub mod features;

/// The fixed-shape encoded sample produced per example
pub mod sample;

/// Collaborator traits (annotation index, features, layout assembler)
pub mod traits;
