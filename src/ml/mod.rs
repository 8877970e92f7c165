// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// Tensor-side helpers that sit between the data pipeline and
// whatever model consumes the batches:
//
//   loss.rs   — logit BCE loss and VQA soft accuracy
//   evalai.rs — argmax decoding and EvalAI submission records
//
// The model and its training loop are owned by the caller.

/// Loss and accuracy over soft answer targets
pub mod loss;

/// Decoding predictions back into answer strings
pub mod evalai;
