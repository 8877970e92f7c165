// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish a
// specific goal (inspecting datasets or answer scores).
//
// Rules for this layer:
//   - No encoding or tensor math here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The JSON run configuration
pub mod config;

// Dataset name → constructor
pub mod registry;

// Build datasets and read back encoded samples
pub mod inspect_use_case;

// Soft answer scores for a list of human answers
pub mod scores_use_case;
