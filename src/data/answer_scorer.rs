// ============================================================
// Layer 4 — Answer Scorer
// ============================================================
// Turns the list of human answers for one question into a soft
// target vector over the answer vocabulary, using the VQA
// accuracy metric's leave-one-annotator-out agreement:
//
//   for each distinct answer a:
//     for each position i in 0..N:
//       matches = #{ j != i : answers[j] == a }
//       acc_i   = min(1, matches / 3)
//     score(a) = mean(acc_0 .. acc_{N-1})
//
// The mean runs over all N positions, including positions whose
// own answer is not `a`. An answer equal to the unknown id
// always scores 0.
//
// Example: [cat, cat, dog]
//   cat → (1/3 + 1/3 + 2/3) / 3 = 4/9
//   dog → (1/3 + 1/3 + 0  ) / 3 = 2/9

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy)]
pub struct AnswerScorer {
    num_answers: usize,
    unknown_id: usize,
}

impl AnswerScorer {
    pub fn new(num_answers: usize, unknown_id: usize) -> Self {
        Self { num_answers, unknown_id }
    }

    /// Score vector of length `num_answers`. Never fails; ids beyond
    /// the vocabulary are ignored.
    pub fn score(&self, answers: &[usize]) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_answers];
        let n = answers.len();

        let distinct: BTreeSet<usize> = answers.iter().copied().collect();
        for &candidate in &distinct {
            let total = answers.iter().filter(|&&a| a == candidate).count();

            let acc_sum: f64 = answers
                .iter()
                .map(|&held_out| {
                    // Leaving position i out removes one match iff it holds the candidate.
                    let matches = total - usize::from(held_out == candidate);
                    (matches as f64 / 3.0).min(1.0)
                })
                .sum();

            let score = if candidate == self.unknown_id { 0.0 } else { acc_sum / n as f64 };
            if let Some(slot) = scores.get_mut(candidate) {
                *slot = score as f32;
            }
        }

        scores
    }
}
