// ============================================================
// Layer 4 — JSON Annotation Index
// ============================================================
// Loads an annotation index ("imdb") stored as a JSON array:
//
//   [
//     { "version": 1, "dataset": "vqa2", ... },   ← header slot
//     { "question_tokens": [...], ... },          ← slot 1
//     { "question_tokens": [...], ... },          ← slot 2
//     ...
//   ]
//
// Slot 0 is the header, so `len()` counts it and `record(0)`
// returns None. The dataset layer offsets every index by one.
//
// The producer and consumer agree on IMDB_VERSION; the dataset
// refuses to start when they differ.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::domain::{annotation::AnnotationRecord, traits::AnnotationIndex};
use crate::error::{Result, VqaError};

pub const IMDB_VERSION: u32 = 1;

#[derive(Debug, Clone, Deserialize)]
struct IndexHeader {
    version: u32,
}

#[derive(Debug, Clone)]
pub struct JsonAnnotationIndex {
    version: u32,
    records: Vec<AnnotationRecord>,
}

impl JsonAnnotationIndex {
    pub fn new(version: u32, records: Vec<AnnotationRecord>) -> Self {
        Self { version, records }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return Err(VqaError::format(format!(
                "unknown imdb format for '{}'",
                path.display()
            )));
        }

        let text = fs::read_to_string(path).map_err(|e| VqaError::io(path, e))?;
        let index = Self::from_json(&text)?;

        tracing::info!(
            "Loaded imdb '{}' (version {}, {} records)",
            path.display(),
            index.version,
            index.records.len()
        );
        Ok(index)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut slots: Vec<serde_json::Value> = serde_json::from_str(text)?;
        if slots.is_empty() {
            return Err(VqaError::format("imdb has no header slot"));
        }

        let header: IndexHeader = serde_json::from_value(slots.remove(0))
            .map_err(|e| VqaError::format(format!("invalid imdb header: {e}")))?;

        let records = slots
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                serde_json::from_value(value).map_err(|e| {
                    VqaError::format(format!("invalid imdb record at slot {}: {e}", i + 1))
                })
            })
            .collect::<Result<Vec<AnnotationRecord>>>()?;

        Ok(Self { version: header.version, records })
    }
}

impl AnnotationIndex for JsonAnnotationIndex {
    fn len(&self) -> usize {
        self.records.len() + 1
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn record(&self, slot: usize) -> Option<&AnnotationRecord> {
        slot.checked_sub(1).and_then(|i| self.records.get(i))
    }
}
