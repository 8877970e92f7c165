// Shared fixtures for the dataset-level tests.

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use crate::data::{
    config::DatasetConfig,
    dataset::VqaDataset,
    encoder::{EncoderConfig, ExampleEncoder},
    features::NoFeatures,
    imdb::{JsonAnnotationIndex, IMDB_VERSION},
    vocab::VocabularyIndex,
};
use crate::domain::annotation::AnnotationRecord;

pub const QUESTION_TOKENS: [&str; 6] = ["<unk>", "what", "color", "is", "the", "cat"];
pub const ANSWER_TOKENS: [&str; 5] = ["<unk>", "cat", "red", "blue", "2"];

/// Records alternate between a unanimous "cat" and a unanimous "red".
pub fn records(n: usize) -> Vec<AnnotationRecord> {
    (0..n)
        .map(|i| {
            let mut record = AnnotationRecord::with_question(["what", "color", "is", "the", "cat"]);
            record.question_id = Some(i as i64 + 1);
            let answer = if i % 2 == 0 { "cat" } else { "red" };
            record.valid_answers = Some(vec![answer.to_string(); 10]);
            record
        })
        .collect()
}

pub fn question_vocab() -> Arc<VocabularyIndex> {
    Arc::new(VocabularyIndex::from_tokens(QUESTION_TOKENS).unwrap())
}

pub fn answer_vocab() -> Arc<VocabularyIndex> {
    Arc::new(VocabularyIndex::from_tokens(ANSWER_TOKENS).unwrap())
}

pub fn encoder(name: &str) -> ExampleEncoder {
    ExampleEncoder::new(EncoderConfig::new(name, 8), question_vocab(), answer_vocab())
}

pub fn dataset(name: &str, n: usize) -> VqaDataset<NoFeatures> {
    let index = JsonAnnotationIndex::new(IMDB_VERSION, records(n));
    VqaDataset::from_parts(index, NoFeatures, encoder(name), false).unwrap()
}

/// Imdb and vocabulary files on disk plus a config pointing at them.
pub struct Fixture {
    pub config: DatasetConfig,
    _dir: TempDir,
}

impl Fixture {
    pub fn new(n: usize) -> Self {
        Self::with_version(n, IMDB_VERSION)
    }

    pub fn with_version(n: usize, version: u32) -> Self {
        let dir = TempDir::new().unwrap();

        let mut slots = vec![serde_json::json!({ "version": version })];
        slots.extend(records(n).iter().map(|r| serde_json::to_value(r).unwrap()));
        fs::write(dir.path().join("imdb.json"), serde_json::to_string(&slots).unwrap()).unwrap();
        fs::write(dir.path().join("questions.txt"), QUESTION_TOKENS.join("\n")).unwrap();
        fs::write(dir.path().join("answers.txt"), ANSWER_TOKENS.join("\n")).unwrap();

        let config = DatasetConfig::new(dir.path(), "imdb.json", "questions.txt", "answers.txt", 8);
        Self { config, _dir: dir }
    }
}
