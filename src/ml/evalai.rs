// ============================================================
// Layer 5 — Prediction Decoding
// ============================================================
// Turns a [batch, answers] score tensor back into answer strings
// and into the {question_id, answer} records expected by the
// EvalAI submission tooling.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::vocab::VocabularyIndex;
use crate::error::{Result, VqaError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalAiPrediction {
    pub question_id: i64,
    pub answer: String,
}

/// Row-wise argmax as plain answer ids.
pub fn predicted_answer_ids<B: Backend>(logits: Tensor<B, 2>) -> Vec<usize> {
    logits
        .argmax(1)
        .into_data()
        .iter::<i64>()
        .map(|id| id as usize)
        .collect()
}

pub fn decode_answers<B: Backend>(
    vocab: &VocabularyIndex,
    logits: Tensor<B, 2>,
) -> Result<Vec<String>> {
    predicted_answer_ids(logits)
        .into_iter()
        .map(|id| vocab.token_of(id).map(str::to_string))
        .collect()
}

pub fn format_for_evalai<B: Backend>(
    vocab: &VocabularyIndex,
    question_ids: &[Option<i64>],
    logits: Tensor<B, 2>,
) -> Result<Vec<EvalAiPrediction>> {
    let answers = decode_answers(vocab, logits)?;
    if answers.len() != question_ids.len() {
        return Err(VqaError::format(format!(
            "{} predictions for {} questions",
            answers.len(),
            question_ids.len()
        )));
    }

    question_ids
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(row, (question_id, answer))| {
            let question_id = question_id.ok_or_else(|| {
                VqaError::format(format!("batch row {row} has no question_id"))
            })?;
            Ok(EvalAiPrediction { question_id, answer })
        })
        .collect()
}
