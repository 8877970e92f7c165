// ============================================================
// Layer 5 — VQA Loss and Accuracy
// ============================================================
// Training targets are soft scores in [0, 1] per answer, so the
// loss is a per-answer binary cross-entropy on the logits rather
// than a softmax cross-entropy over a single label.
//
//   logit_bce    = mean_{n,a} BCE(sigmoid(x_na), t_na) * A
//   vqa_accuracy = mean_n t[n, argmax_a x_na]
//
// BCE-with-logits is written in the overflow-safe form
//   max(x, 0) - x·t + ln(1 + e^{-|x|})

use burn::prelude::*;

/// Mean BCE-with-logits over every entry, scaled by the answer-space size.
pub fn logit_bce<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
    let [_, num_answers] = logits.dims();

    let positive_part = logits.clone().clamp_min(0.0);
    let log_term = logits.clone().abs().neg().exp().log1p();
    let per_entry = positive_part - logits * targets + log_term;

    per_entry.mean() * (num_answers as f64)
}

/// Soft accuracy: the target score of each row's highest logit, averaged.
pub fn vqa_accuracy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> f64 {
    let [batch_size, _] = logits.dims();
    if batch_size == 0 {
        return 0.0;
    }

    // argmax(1) keeps the reduced dim: [batch, 1], which is exactly what gather wants
    let predicted = logits.argmax(1);
    let hits = targets.gather(1, predicted);

    hits.sum().into_scalar().elem::<f64>() / batch_size as f64
}

#[derive(Debug, Clone)]
pub struct LossAndMetrics<B: Backend> {
    pub loss: Tensor<B, 1>,
    pub accuracy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn matrix(values: &[f32], shape: [usize; 2]) -> Tensor<TestBackend, 2> {
        Tensor::<TestBackend, 1>::from_floats(values, &Default::default()).reshape(shape)
    }

    #[test]
    fn test_accuracy_reads_target_at_argmax() {
        let logits = matrix(&[0.1, 2.0, -1.0, 3.0, 0.0, 0.5], [2, 3]);
        let targets = matrix(&[0.0, 0.6, 1.0, 0.3, 1.0, 0.0], [2, 3]);
        let acc = vqa_accuracy(logits, targets);
        assert!((acc - (0.6 + 0.3) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_bce_zero_logits() {
        // At x = 0 every entry costs ln 2 regardless of target.
        let logits = matrix(&[0.0; 4], [2, 2]);
        let targets = matrix(&[1.0, 0.0, 0.5, 0.0], [2, 2]);
        let loss = logit_bce(logits, targets).into_scalar().elem::<f64>();
        assert!((loss - 2.0 * std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_bce_confident_and_right_is_small() {
        let logits = matrix(&[20.0, -20.0], [1, 2]);
        let targets = matrix(&[1.0, 0.0], [1, 2]);
        let loss = logit_bce(logits, targets).into_scalar().elem::<f64>();
        assert!(loss < 1e-6);
    }
}
