// ============================================================
// Layer 4 — Dataset Metadata Trait
// ============================================================
// Everything a training loop asks of a dataset besides samples:
// its vocabularies, how to batch, how to score model output and
// how to turn predictions back into answers.
//
// Implementations:
//   - VqaDataset              → answers from its own state
//   - ConcatenatedDatasetView → forwards to its first dataset

use burn::prelude::*;
use std::sync::Arc;

use crate::data::{
    batcher::{VqaBatch, VqaBatcher},
    vocab::VocabularyIndex,
};
use crate::error::Result;
use crate::ml::{evalai::EvalAiPrediction, loss::LossAndMetrics};

pub trait VqaSource {
    /// Dataset name used in logs and registry lookups.
    fn name(&self) -> &str;

    /// Question-token vocabulary.
    fn text_vocab(&self) -> &Arc<VocabularyIndex>;

    /// Answer vocabulary; id 0 is the unknown answer.
    fn answer_vocab(&self) -> &Arc<VocabularyIndex>;

    /// Width of the score vectors and of the model's logits.
    fn answer_space_size(&self) -> usize;

    /// Batch preparation: a batcher placing tensors on `device`.
    fn batcher<B: Backend>(&self, device: B::Device) -> VqaBatcher<B>;

    /// Sigmoid BCE of `logits` [N, answer vocab] against the batch scores,
    /// plus mean soft accuracy of the argmax prediction.
    ///
    /// Fails with a format error when the batch carries no answer targets.
    fn calculate_loss_and_metrics<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        batch: &VqaBatch<B>,
    ) -> Result<LossAndMetrics<B>>;

    /// Logs ground truth and predicted answers; returns the predictions.
    fn verbose_dump<B: Backend>(&self, batch: &VqaBatch<B>, logits: Tensor<B, 2>) -> Result<Vec<String>>;

    /// One `{question_id, answer}` entry per sample, answer by argmax.
    fn format_for_evalai<B: Backend>(
        &self,
        batch: &VqaBatch<B>,
        logits: Tensor<B, 2>,
    ) -> Result<Vec<EvalAiPrediction>>;
}
