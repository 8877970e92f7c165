// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// The JSON file handed to the CLI: a list of dataset configs
// that are built and concatenated in order.
//
// Example:
//   {
//     "datasets": [
//       { "name": "vqa2", "data_root_dir": "data", "imdb_file": "imdb/train.json",
//         "vocab_question": "vocab/questions.txt", "vocab_answer": "vocab/answers.txt",
//         "T_encoder": 14, "dataset_type": "train" }
//     ]
//   }

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::data::config::DatasetConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub datasets: Vec<DatasetConfig>,
}

impl RunConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read run config '{}'", path.display()))?;
        let config: RunConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid run config '{}'", path.display()))?;
        tracing::debug!("Loaded run config with {} dataset(s)", config.datasets.len());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_dataset_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(
            &path,
            r#"{"datasets": [{
                "data_root_dir": "data", "imdb_file": "train.json",
                "vocab_question": "q.txt", "vocab_answer": "a.txt",
                "T_encoder": 14, "dataset_type": "train"
            }]}"#,
        )
        .unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.datasets[0].name, "vqa2");
        assert_eq!(config.datasets[0].t_encoder, 14);
        assert!(config.datasets[0].load_answer);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = RunConfig::from_file("/nonexistent/run.json").unwrap_err();
        assert!(err.to_string().contains("Cannot read run config"));
    }
}
