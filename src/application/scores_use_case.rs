// ============================================================
// Layer 2 — ScoresUseCase
// ============================================================
// Shows the soft training target a list of human answers would
// produce: answers are normalised, looked up in the answer
// vocabulary and scored exactly as the encoder does it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::data::{
    answer_norm::word_tokenize, answer_scorer::AnswerScorer, vocab::VocabularyIndex,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerScore {
    pub answer: String,
    pub id: usize,
    pub score: f32,
}

pub struct ScoresUseCase {
    vocab: VocabularyIndex,
}

impl ScoresUseCase {
    pub fn new(vocab_path: impl AsRef<Path>) -> Result<Self> {
        let vocab_path = vocab_path.as_ref();
        let vocab = VocabularyIndex::from_file(vocab_path)
            .with_context(|| format!("Failed to load answer vocabulary '{}'", vocab_path.display()))?;
        Ok(Self { vocab })
    }

    pub fn from_vocab(vocab: VocabularyIndex) -> Self {
        Self { vocab }
    }

    /// Non-zero scores, highest first.
    pub fn execute(&self, answers: &[String]) -> Vec<AnswerScore> {
        let ids: Vec<usize> = answers.iter().map(|a| self.vocab.id_of(&word_tokenize(a))).collect();
        let scorer = AnswerScorer::new(self.vocab.size(), self.vocab.unknown_id());

        let mut scored: Vec<AnswerScore> = scorer
            .score(&ids)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .filter_map(|(id, score)| {
                let answer = self.vocab.token_of(id).ok()?.to_string();
                Some(AnswerScore { answer, id, score })
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
        tracing::debug!("{} of {} answers scored above zero", scored.len(), answers.len());
        scored
    }
}
