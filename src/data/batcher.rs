// ============================================================
// Layer 4 — VQA Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<Sample> into
// tensors for the model forward pass.
//
// Shapes (N = batch size):
//   texts            [N, T_encoder]       Int
//   texts_len        [N]                  Int
//   image_features   [N, rows, cols] per feature position
//   answer_label     [N]                  Int
//   valid_ans_labels [N, 10]              Int
//   scores           [N, answer vocab]    Float
//   gt_layout        [N, T_decoder]       Int
//
// Every sample from one dataset already has identical shapes,
// so stacking is flatten-then-reshape. Optional parts are only
// stacked when every sample in the batch carries them.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::domain::sample::Sample;

/// Answer targets of a fully labelled batch.
#[derive(Debug, Clone)]
pub struct AnswerBatch<B: Backend> {
    /// One sampled valid answer id per sample: [N]
    pub answer_label: Tensor<B, 1, Int>,

    /// Valid answer ids padded with -1: [N, 10]
    pub valid_ans_labels: Tensor<B, 2, Int>,

    /// Soft score per answer id: [N, answer vocab]
    pub scores: Tensor<B, 2>,
}

/// A stacked batch of encoded samples, ready for a forward pass.
#[derive(Debug, Clone)]
pub struct VqaBatch<B: Backend> {
    /// Padded question token ids: [N, T_encoder]
    pub texts: Tensor<B, 2, Int>,

    /// Unpadded question lengths: [N]
    pub texts_len: Tensor<B, 1, Int>,

    /// Carried through untouched for evaluation output
    pub question_ids: Vec<Option<i64>>,

    /// One [N, rows, cols] tensor per feature position
    pub image_features: Vec<Tensor<B, 3>>,

    /// None unless every sample is labelled
    pub answers: Option<AnswerBatch<B>>,

    /// None unless every sample has a ground-truth layout: [N, T_decoder]
    pub gt_layout: Option<Tensor<B, 2, Int>>,

    /// Raw answer strings per sample, for debugging output.
    pub raw_answers: Vec<Option<Vec<String>>>,
}

impl<B: Backend> VqaBatch<B> {
    /// Number of samples stacked in this batch.
    pub fn batch_size(&self) -> usize {
        self.question_ids.len()
    }
}

/// Stacks samples into a VqaBatch on a fixed device.
#[derive(Clone, Debug)]
pub struct VqaBatcher<B: Backend> {
    /// Device every tensor of the batch is created on
    pub device: B::Device,
}

impl<B: Backend> VqaBatcher<B> {
    /// Create a batcher placing tensors on `device`.
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack equal-length rows into an [n, width] Int tensor.
    fn int_matrix<'a>(&self, rows: impl Iterator<Item = &'a [i32]>, n: usize) -> Tensor<B, 2, Int> {
        let mut width = 0;
        let mut flat: Vec<i32> = Vec::new();
        for row in rows {
            width = row.len();
            flat.extend_from_slice(row);
        }
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([n, width])
    }

    /// Stack each feature position across the batch.
    ///
    /// Positions are kept up to the shortest feature list. A position
    /// whose shapes differ between samples ends the stacking there.
    fn stack_features(&self, items: &[Sample]) -> Vec<Tensor<B, 3>> {
        let positions = items.iter().map(|s| s.image_features.len()).min().unwrap_or(0);
        let mut stacked = Vec::with_capacity(positions);

        for position in 0..positions {
            let shape = items[0].image_features[position].shape();
            if items.iter().any(|s| s.image_features[position].shape() != shape) {
                tracing::warn!(
                    "image_feature_{} has mixed shapes within a batch; dropping it and later positions",
                    position
                );
                break;
            }
            let flat: Vec<f32> = items
                .iter()
                .flat_map(|s| s.image_features[position].data().iter().copied())
                .collect();
            stacked.push(
                Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
                    .reshape([items.len(), shape[0], shape[1]]),
            );
        }
        stacked
    }
}

impl<B: Backend> Batcher<Sample, VqaBatch<B>> for VqaBatcher<B> {
    fn batch(&self, items: Vec<Sample>) -> VqaBatch<B> {
        let batch_size = items.len();

        // ── Step 1: Questions ────────────────────────────────────────────────
        let texts = self.int_matrix(items.iter().map(|s| s.question.ids.as_slice()), batch_size);

        let lengths: Vec<i32> = items.iter().map(|s| s.question.seq_length as i32).collect();
        let texts_len = Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &self.device);

        // ── Step 2: Image features ───────────────────────────────────────────
        let image_features = self.stack_features(&items);

        // ── Step 3: Answer targets (only when every sample is labelled) ──────
        let answers = items
            .iter()
            .map(|s| s.answers.labelled())
            .collect::<Option<Vec<_>>>()
            .map(|labelled| {
                let labels: Vec<i32> = labelled.iter().map(|a| a.answer_label).collect();
                let num_answers = labelled.first().map_or(0, |a| a.scores.len());
                let scores: Vec<f32> =
                    labelled.iter().flat_map(|a| a.scores.iter().copied()).collect();

                AnswerBatch {
                    answer_label: Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device),
                    valid_ans_labels: self.int_matrix(
                        labelled.iter().map(|a| a.valid_ans_labels.as_slice()),
                        batch_size,
                    ),
                    scores: Tensor::<B, 1>::from_floats(scores.as_slice(), &self.device)
                        .reshape([batch_size, num_answers]),
                }
            });

        // ── Step 4: Ground-truth layouts ─────────────────────────────────────
        let gt_layout = items
            .iter()
            .map(|s| s.gt_layout.ids())
            .collect::<Option<Vec<_>>>()
            .map(|rows| self.int_matrix(rows.into_iter(), batch_size));

        VqaBatch {
            texts,
            texts_len,
            question_ids: items.iter().map(|s| s.question_id).collect(),
            image_features,
            answers,
            gt_layout,
            raw_answers: items.into_iter().map(|s| s.valid_answers).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureTensor;
    use crate::domain::sample::{
        AnswerTargets, EncodedQuestion, LabelledAnswers, LayoutTarget, MAX_VALID_ANSWERS, NO_ANSWER,
    };

    type TestBackend = burn::backend::NdArray;

    fn sample(question_id: i64, label: i32) -> Sample {
        let mut scores = vec![0.0; 5];
        scores[label as usize] = 1.0;
        let mut valid = vec![NO_ANSWER; MAX_VALID_ANSWERS];
        valid[0] = label;
        Sample {
            question: EncodedQuestion { ids: vec![2, 3, 0, 0], seq_length: 2 },
            question_id: Some(question_id),
            image_features: vec![FeatureTensor::new([2, 3], vec![1.0; 6]).unwrap()],
            image_dim: None,
            image_boxes: None,
            answers: AnswerTargets::Labelled(LabelledAnswers {
                answer_label: label,
                valid_ans_labels: valid,
                scores,
            }),
            valid_answers: Some(vec!["x".to_string()]),
            gt_layout: LayoutTarget::Disabled,
        }
    }

    fn batcher() -> VqaBatcher<TestBackend> {
        VqaBatcher::new(Default::default())
    }

    #[test]
    fn test_batch_shapes() {
        let batch = batcher().batch(vec![sample(1, 1), sample(2, 3), sample(3, 4)]);
        assert_eq!(batch.texts.dims(), [3, 4]);
        assert_eq!(batch.texts_len.dims(), [3]);
        assert_eq!(batch.image_features.len(), 1);
        assert_eq!(batch.image_features[0].dims(), [3, 2, 3]);

        let answers = batch.answers.expect("labelled batch");
        assert_eq!(answers.answer_label.dims(), [3]);
        assert_eq!(answers.valid_ans_labels.dims(), [3, MAX_VALID_ANSWERS]);
        assert_eq!(answers.scores.dims(), [3, 5]);
        assert!(batch.gt_layout.is_none());
        assert_eq!(batch.question_ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_batch_values() {
        let batch = batcher().batch(vec![sample(1, 1), sample(2, 3)]);
        let labels: Vec<i64> = batch.answers.unwrap().answer_label.into_data().iter::<i64>().collect();
        assert_eq!(labels, vec![1, 3]);
        let lens: Vec<i64> = batch.texts_len.into_data().iter::<i64>().collect();
        assert_eq!(lens, vec![2, 2]);
    }

    #[test]
    fn test_unlabelled_sample_drops_answers() {
        let mut unlabelled = sample(2, 1);
        unlabelled.answers = AnswerTargets::Unlabelled;
        let batch = batcher().batch(vec![sample(1, 1), unlabelled]);
        assert!(batch.answers.is_none());
    }

    #[test]
    fn test_layout_stacked_when_present() {
        let mut a = sample(1, 1);
        let mut b = sample(2, 2);
        a.gt_layout = LayoutTarget::Supervised(vec![1, 2, 0]);
        b.gt_layout = LayoutTarget::Supervised(vec![2, 0, 0]);
        let batch = batcher().batch(vec![a, b]);
        assert_eq!(batch.gt_layout.unwrap().dims(), [2, 3]);
    }

    #[test]
    fn test_mixed_feature_shapes_dropped() {
        let mut odd = sample(2, 1);
        odd.image_features = vec![FeatureTensor::new([1, 3], vec![0.0; 3]).unwrap()];
        let batch = batcher().batch(vec![sample(1, 1), odd]);
        assert!(batch.image_features.is_empty());
    }
}
