// ============================================================
// Layer 3 — Core Traits (Collaborator Seams)
// ============================================================
// The dataset never reaches into storage formats directly.
// It talks to three collaborators through these traits:
//
//   AnnotationIndex  → versioned positional record access
//   FeatureProvider  → image feature tensors per slot
//   LayoutAssembler  → module-name programs to fixed-length ids
//
// Concrete implementations live in the data layer; tests and
// callers with their own storage can plug in anything else.

use crate::domain::{annotation::AnnotationRecord, features::FeatureSet};
use crate::error::Result;

// ─── AnnotationIndex ─────────────────────────────────────────────────────────
/// Slot 0 of every index is reserved for the header, so
/// `record(0)` is allowed to return None.
pub trait AnnotationIndex: Send + Sync {
    /// Total slot count, header slot included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Format version declared by the producer of the index.
    fn version(&self) -> u32;

    fn record(&self, slot: usize) -> Option<&AnnotationRecord>;
}

// ─── FeatureProvider ─────────────────────────────────────────────────────────
/// Receives the same slot index as `AnnotationIndex::record`.
pub trait FeatureProvider: Send + Sync {
    fn get(&self, slot: usize) -> Result<FeatureSet>;
}

impl<P: FeatureProvider + ?Sized> FeatureProvider for Box<P> {
    fn get(&self, slot: usize) -> Result<FeatureSet> {
        (**self).get(slot)
    }
}

// ─── LayoutAssembler ─────────────────────────────────────────────────────────
pub trait LayoutAssembler: Send + Sync {
    /// Map module names to ids and pad to exactly `length` entries.
    fn module_list_to_tokens(&self, modules: &[String], length: usize) -> Result<Vec<i32>>;
}
