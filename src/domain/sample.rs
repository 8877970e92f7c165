// ============================================================
// Layer 3 — Sample Domain Type
// ============================================================
// One fully encoded example, ready to be batched.
//
// The optional parts are sum types rather than missing keys:
// whether a sample carries answer targets or a layout program
// is decided once by the encoder configuration, so every
// sample from the same dataset has the same shape.

use serde::Serialize;

use crate::domain::features::FeatureTensor;

/// Capacity of the valid-answer id slot.
pub const MAX_VALID_ANSWERS: usize = 10;

/// Fill value for unused valid-answer slots; never a vocabulary id.
pub const NO_ANSWER: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedQuestion {
    /// Exactly `encoder_length` ids, zero padded.
    pub ids: Vec<i32>,
    /// Token count before truncation.
    pub seq_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledAnswers {
    pub answer_label: i32,
    /// Exactly MAX_VALID_ANSWERS entries, NO_ANSWER padded.
    pub valid_ans_labels: Vec<i32>,
    /// Soft target per answer id; length equals the answer vocabulary size.
    pub scores: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnswerTargets {
    Unlabelled,
    Labelled(LabelledAnswers),
}

impl AnswerTargets {
    pub fn labelled(&self) -> Option<&LabelledAnswers> {
        match self {
            Self::Labelled(answers) => Some(answers),
            Self::Unlabelled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LayoutTarget {
    Disabled,
    /// Exactly `T_decoder` module ids.
    Supervised(Vec<i32>),
}

impl LayoutTarget {
    pub fn ids(&self) -> Option<&[i32]> {
        match self {
            Self::Supervised(ids) => Some(ids),
            Self::Disabled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub question: EncodedQuestion,
    pub question_id: Option<i64>,
    #[serde(skip)]
    pub image_features: Vec<FeatureTensor>,
    pub image_dim: Option<usize>,
    pub image_boxes: Option<Vec<[f32; 4]>>,
    pub answers: AnswerTargets,
    pub valid_answers: Option<Vec<String>>,
    pub gt_layout: LayoutTarget,
}
