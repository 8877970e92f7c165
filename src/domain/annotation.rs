// ============================================================
// Layer 3 — AnnotationRecord Domain Type
// ============================================================
// One question/image unit as stored in the annotation index
// (the "imdb"). Upstream datasets disagree on how answers are
// recorded, so three answer fields are optional:
//
//   answer        — a single ground-truth string
//   valid_answers — every accepted answer, possibly ending in
//                   the <copy> sentinel
//   all_answers   — the raw list of human answers
//
// When more than one is present, `answer` wins over
// `valid_answers`, which wins over `all_answers`.

use serde::{Deserialize, Serialize};

/// Trailing marker in `valid_answers` meaning "copy from context".
pub const COPY_TOKEN: &str = "<copy>";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Required: a record without a question is malformed.
    pub question_tokens: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_str: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_answers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_answers: Option<Vec<String>>,

    /// Only ever passed through to the sample, never scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt_layout_tokens: Option<Vec<String>>,
}

impl AnnotationRecord {
    /// Create a record holding only question tokens
    pub fn with_question<S: Into<String>>(tokens: impl IntoIterator<Item = S>) -> Self {
        Self {
            question_tokens: tokens.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// `valid_answers` with a trailing <copy> sentinel removed.
    pub fn valid_answers_without_copy(&self) -> Option<&[String]> {
        self.valid_answers.as_deref().map(|answers| match answers.split_last() {
            Some((last, rest)) if last == COPY_TOKEN => rest,
            _ => answers,
        })
    }

    /// Raw answer strings handed through to the sample untouched.
    /// Order: all_answers, answers, then sentinel-free valid_answers.
    pub fn passthrough_answers(&self) -> Option<Vec<String>> {
        self.all_answers
            .clone()
            .or_else(|| self.answers.clone())
            .or_else(|| self.valid_answers_without_copy().map(<[String]>::to_vec))
    }
}
