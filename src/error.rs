// ============================================================
// Library Error Type
// ============================================================
// Every fallible operation in the data pipeline returns
// VqaError. The application and CLI layers wrap it in anyhow
// with extra context; nothing below them retries.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VqaError {
    /// Unrecognised annotation/vocabulary layout, or a record that
    /// lacks the fields the current configuration requires.
    #[error("format error: {0}")]
    Format(String),

    #[error("imdb version mismatch: expected {expected}, observed {observed}")]
    VersionMismatch { expected: u32, observed: u32 },

    #[error("index {index} out of range for length {len}")]
    Index { index: usize, len: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VqaError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, VqaError>;
