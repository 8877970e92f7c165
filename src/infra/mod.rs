// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to the data
// pipeline itself:
//
//   metrics.rs — per-pass loss/accuracy meter and a CSV logger
//                for later analysis and plotting.
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// Loss/accuracy meter and CSV metrics logger
pub mod metrics;
