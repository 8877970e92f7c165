// ============================================================
// Layer 4 — Example Encoder
// ============================================================
// Converts one AnnotationRecord into a fixed-shape Sample.
//
//   question_tokens ──► text vocab ──► [T_encoder] ids, zero padded
//
//   answer fields   ──► pick primary label (random for lists)
//                   ──► valid-answer ids [10], -1 padded
//                   ──► AnswerScorer ──► soft scores [answer vocab]
//
//   gt_layout_tokens ─► optional prune ─► assembler ─► [T_decoder]
//
//   FeatureSet      ──► image_feature_0.. + box metadata
//
// Answer-field precedence: answer > valid_answers > all_answers.
//
// The two list paths differ:
//   valid_answers — the whole (sentinel-free) list is used as is
//   all_answers   — MAX_VALID_ANSWERS draws WITH replacement

use rand::{seq::SliceRandom, Rng};
use std::sync::Arc;

use crate::data::{
    answer_norm::word_tokenize, answer_scorer::AnswerScorer, layout::prune_filter_modules,
    vocab::VocabularyIndex,
};
use crate::domain::{
    annotation::AnnotationRecord,
    features::FeatureSet,
    sample::{
        AnswerTargets, EncodedQuestion, LabelledAnswers, LayoutTarget, Sample, MAX_VALID_ANSWERS,
        NO_ANSWER,
    },
    traits::LayoutAssembler,
};
use crate::error::{Result, VqaError};

/// TextVQA only samples from the last six human answers.
const TEXTVQA_ANSWER_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMode {
    Skip,
    Load,
}

#[derive(Clone)]
pub enum LayoutMode {
    Disabled,
    Supervised {
        t_decoder: usize,
        prune_filter_module: bool,
        assembler: Arc<dyn LayoutAssembler>,
    },
}

/// Fixed at dataset construction; decides the shape of every Sample.
#[derive(Clone)]
pub struct EncoderConfig {
    /// Questions are padded or truncated to this many tokens
    pub encoder_length: usize,

    /// Slots in `valid_ans_labels`; longer answer lists still count in the scores
    pub max_valid_answers: usize,

    pub answers: AnswerMode,
    pub layout: LayoutMode,

    /// Selects per-dataset answer handling (e.g. the TextVQA sampling window)
    pub dataset_name: String,
}

impl EncoderConfig {
    pub fn new(dataset_name: impl Into<String>, encoder_length: usize) -> Self {
        Self {
            encoder_length,
            max_valid_answers: MAX_VALID_ANSWERS,
            answers: AnswerMode::Load,
            layout: LayoutMode::Disabled,
            dataset_name: dataset_name.into(),
        }
    }

    pub fn with_answers(mut self, answers: AnswerMode) -> Self {
        self.answers = answers;
        self
    }

    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    /// `T_decoder` when layouts are supervised.
    pub fn layout_length(&self) -> Option<usize> {
        match &self.layout {
            LayoutMode::Supervised { t_decoder, .. } => Some(*t_decoder),
            LayoutMode::Disabled => None,
        }
    }

    /// Shapes every Sample must share to be batched together:
    /// (encoder_length, max_valid_answers, layout length).
    pub fn sample_shape(&self) -> (usize, usize, Option<usize>) {
        (self.encoder_length, self.max_valid_answers, self.layout_length())
    }
}

/// Turns one annotation record plus its features into a Sample.
pub struct ExampleEncoder {
    config: EncoderConfig,
    text_vocab: Arc<VocabularyIndex>,
    answer_vocab: Arc<VocabularyIndex>,
    scorer: AnswerScorer,
}

impl ExampleEncoder {
    pub fn new(
        config: EncoderConfig,
        text_vocab: Arc<VocabularyIndex>,
        answer_vocab: Arc<VocabularyIndex>,
    ) -> Self {
        let scorer = AnswerScorer::new(answer_vocab.size(), answer_vocab.unknown_id());
        Self { config, text_vocab, answer_vocab, scorer }
    }

    /// The settings fixed at construction.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Vocabulary the question tokens are looked up in.
    pub fn text_vocab(&self) -> &Arc<VocabularyIndex> {
        &self.text_vocab
    }

    /// Vocabulary spanning the answer space; its size is the score length.
    pub fn answer_vocab(&self) -> &Arc<VocabularyIndex> {
        &self.answer_vocab
    }

    /// Encode one record; `rng` picks the sampled answer label.
    pub fn encode<R: Rng + ?Sized>(
        &self,
        record: &AnnotationRecord,
        features: &FeatureSet,
        rng: &mut R,
    ) -> Result<Sample> {
        let question = self.encode_question(&record.question_tokens);

        let answers = match self.config.answers {
            AnswerMode::Load => AnswerTargets::Labelled(self.encode_answers(record, rng)?),
            AnswerMode::Skip => AnswerTargets::Unlabelled,
        };

        let gt_layout = self.encode_layout(record)?;

        let info = features.primary_info();
        Ok(Sample {
            question,
            question_id: record.question_id,
            image_features: features.ordered_features(),
            image_dim: info.and_then(|i| i.max_bboxes),
            image_boxes: info.and_then(|i| i.bboxes.clone()),
            answers,
            valid_answers: record.passthrough_answers(),
            gt_layout,
        })
    }

    fn encode_question(&self, tokens: &[String]) -> EncodedQuestion {
        let mut ids = vec![0i32; self.config.encoder_length];
        for (slot, token) in ids.iter_mut().zip(tokens) {
            *slot = self.text_vocab.id_of(token) as i32;
        }
        EncodedQuestion { ids, seq_length: tokens.len() }
    }

    fn encode_answers<R: Rng + ?Sized>(
        &self,
        record: &AnnotationRecord,
        rng: &mut R,
    ) -> Result<LabelledAnswers> {
        if let Some(answer) = &record.answer {
            return Ok(LabelledAnswers {
                answer_label: self.answer_vocab.id_of(answer) as i32,
                valid_ans_labels: vec![NO_ANSWER; self.config.max_valid_answers],
                scores: vec![0.0; self.answer_vocab.size()],
            });
        }

        let (primary, valid) = if let Some(valid) = record.valid_answers_without_copy() {
            let primary = choose_answer(valid, rng)?;
            (primary, valid.to_vec())
        } else if let Some(all) = &record.all_answers {
            let window = if self.config.dataset_name == "textvqa" {
                &all[all.len().saturating_sub(TEXTVQA_ANSWER_WINDOW)..]
            } else {
                &all[..]
            };
            let primary = choose_answer(window, rng)?;
            let draws = (0..self.config.max_valid_answers)
                .map(|_| choose_answer(window, rng))
                .collect::<Result<Vec<_>>>()?;
            (primary, draws)
        } else {
            return Err(VqaError::format(format!(
                "record {:?} has none of answer, valid_answers, all_answers",
                record.question_id
            )));
        };

        let valid_ids: Vec<usize> = valid
            .iter()
            .map(|ans| self.answer_vocab.id_of(&word_tokenize(ans)))
            .collect();

        let mut valid_ans_labels = vec![NO_ANSWER; self.config.max_valid_answers];
        for (slot, &id) in valid_ans_labels.iter_mut().zip(&valid_ids) {
            *slot = id as i32;
        }

        Ok(LabelledAnswers {
            answer_label: self.answer_vocab.id_of(&primary) as i32,
            valid_ans_labels,
            scores: self.scorer.score(&valid_ids),
        })
    }

    fn encode_layout(&self, record: &AnnotationRecord) -> Result<LayoutTarget> {
        let LayoutMode::Supervised { t_decoder, prune_filter_module, assembler } =
            &self.config.layout
        else {
            return Ok(LayoutTarget::Disabled);
        };

        let tokens = record.gt_layout_tokens.as_deref().ok_or_else(|| {
            VqaError::format(format!("record {:?} has no gt_layout_tokens", record.question_id))
        })?;

        let ids = if *prune_filter_module {
            assembler.module_list_to_tokens(&prune_filter_modules(tokens), *t_decoder)?
        } else {
            assembler.module_list_to_tokens(tokens, *t_decoder)?
        };
        Ok(LayoutTarget::Supervised(ids))
    }
}

fn choose_answer<R: Rng + ?Sized>(candidates: &[String], rng: &mut R) -> Result<String> {
    candidates
        .choose(rng)
        .cloned()
        .ok_or_else(|| VqaError::format("answer list is empty"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::layout::ModuleAssembler;
    use crate::domain::annotation::COPY_TOKEN;
    use crate::domain::features::{feature_key, info_key, FeatureTensor, ImageInfo};
    use rand::{rngs::StdRng, SeedableRng};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn text_vocab() -> Arc<VocabularyIndex> {
        Arc::new(VocabularyIndex::from_tokens(["<pad>", "<unk>", "what", "color", "is", "the", "cat"]).unwrap())
    }

    fn answer_vocab() -> Arc<VocabularyIndex> {
        Arc::new(
            VocabularyIndex::from_tokens(["<unk>", "cat", "dog", "red", "blue", "2", "3", "dog 's"])
                .unwrap(),
        )
    }

    fn encoder(config: EncoderConfig) -> ExampleEncoder {
        ExampleEncoder::new(config, text_vocab(), answer_vocab())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn encode(enc: &ExampleEncoder, record: &AnnotationRecord) -> Result<Sample> {
        enc.encode(record, &FeatureSet::default(), &mut rng())
    }

    fn labelled(sample: &Sample) -> &LabelledAnswers {
        sample.answers.labelled().expect("sample should be labelled")
    }

    #[test]
    fn test_question_zero_padded() {
        let enc = encoder(EncoderConfig::new("vqa2", 6));
        let mut record = AnnotationRecord::with_question(["what", "color", "zebra"]);
        record.answer = Some("red".into());

        let sample = encode(&enc, &record).unwrap();
        assert_eq!(sample.question.ids, vec![2, 3, 1, 0, 0, 0]);
        assert_eq!(sample.question.seq_length, 3);
    }

    #[test]
    fn test_question_truncated_keeps_true_length() {
        let enc = encoder(EncoderConfig::new("vqa2", 2));
        let mut record = AnnotationRecord::with_question(["what", "color", "is", "the", "cat"]);
        record.answer = Some("red".into());

        let sample = encode(&enc, &record).unwrap();
        assert_eq!(sample.question.ids.len(), 2);
        assert_eq!(sample.question.seq_length, 5);
    }

    #[test]
    fn test_single_answer_round_trip() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.answer = Some("cat".into());

        let sample = encode(&enc, &record).unwrap();
        let answers = labelled(&sample);
        let vocab = answer_vocab();
        assert_eq!(vocab.token_of(answers.answer_label as usize).unwrap(), "cat");
        assert_eq!(answers.valid_ans_labels, vec![NO_ANSWER; MAX_VALID_ANSWERS]);
        assert_eq!(answers.scores.len(), vocab.size());
        assert!(answers.scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_answer_wins_over_lists() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.answer = Some("blue".into());
        record.valid_answers = Some(strings(&["red"; 10]));

        let sample = encode(&enc, &record).unwrap();
        assert_eq!(labelled(&sample).answer_label, 4);
    }

    #[test]
    fn test_valid_answers_drop_copy_and_pad() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.valid_answers = Some(strings(&["Red", "red", "blue", COPY_TOKEN]));

        for seed in 0..20 {
            let sample = enc.encode(&record, &FeatureSet::default(), &mut StdRng::seed_from_u64(seed)).unwrap();
            let answers = labelled(&sample);
            // "Red" is looked up raw as the primary label and misses.
            assert!([0, 3, 4].contains(&answers.answer_label));
            assert_eq!(&answers.valid_ans_labels[..3], &[3, 3, 4]);
            assert!(answers.valid_ans_labels[3..].iter().all(|&id| id == NO_ANSWER));
            assert_eq!(sample.valid_answers, Some(strings(&["Red", "red", "blue"])));
        }
    }

    #[test]
    fn test_valid_answer_scores() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.valid_answers = Some(strings(&["cat", "cat", "dog"]));

        let sample = encode(&enc, &record).unwrap();
        let scores = &labelled(&sample).scores;
        assert!((scores[1] - 4.0 / 9.0).abs() < 1e-6);
        assert!((scores[2] - 2.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_long_valid_list_fills_slots_but_scores_all() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        let mut answers = vec!["dog"];
        answers.extend(["cat"; 11]);
        record.valid_answers = Some(strings(&answers));

        let sample = encode(&enc, &record).unwrap();
        let labelled = labelled(&sample);
        assert_eq!(labelled.valid_ans_labels.len(), MAX_VALID_ANSWERS);
        // first ten ids in list order
        assert_eq!(labelled.valid_ans_labels[0], 2);
        assert!(labelled.valid_ans_labels[1..].iter().all(|&id| id == 1));
        // dog over all twelve: 11 × (1/3) / 12, not 9 × (1/3) / 10
        assert!((labelled.scores[2] - 11.0 / 36.0).abs() < 1e-6);
        assert!((labelled.scores[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_valid_answers_normalised_before_lookup() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.valid_answers = Some(strings(&["Dog's"]));

        let sample = encode(&enc, &record).unwrap();
        assert_eq!(labelled(&sample).valid_ans_labels[0], 7);
    }

    #[test]
    fn test_unknown_answers_score_zero() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.valid_answers = Some(strings(&["zebra"; 10]));

        let sample = encode(&enc, &record).unwrap();
        let answers = labelled(&sample);
        assert_eq!(answers.answer_label, 0);
        assert!(answers.scores.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_all_answers_fill_every_slot() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.all_answers = Some(strings(&["2", "3", "2"]));

        let sample = encode(&enc, &record).unwrap();
        let answers = labelled(&sample);
        assert_eq!(answers.valid_ans_labels.len(), MAX_VALID_ANSWERS);
        assert!(answers.valid_ans_labels.iter().all(|&id| id == 5 || id == 6));
        // Raw list is passed through untouched.
        assert_eq!(sample.valid_answers, Some(strings(&["2", "3", "2"])));
    }

    #[test]
    fn test_textvqa_samples_last_six_only() {
        let enc = encoder(EncoderConfig::new("textvqa", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.all_answers =
            Some(strings(&["cat", "cat", "cat", "cat", "red", "red", "red", "blue", "blue", "red"]));

        for seed in 0..20 {
            let sample = enc.encode(&record, &FeatureSet::default(), &mut StdRng::seed_from_u64(seed)).unwrap();
            let answers = labelled(&sample);
            assert_ne!(answers.answer_label, 1);
            assert!(answers.valid_ans_labels.iter().all(|&id| id == 3 || id == 4));
            assert_eq!(answers.scores[1], 0.0);
        }
    }

    #[test]
    fn test_other_datasets_use_full_all_answers() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.all_answers = Some(strings(&["cat", "red", "red", "red", "red", "red", "red"]));

        let saw_cat = (0..200).any(|seed| {
            let sample = enc.encode(&record, &FeatureSet::default(), &mut StdRng::seed_from_u64(seed)).unwrap();
            labelled(&sample).valid_ans_labels.contains(&1)
        });
        assert!(saw_cat);
    }

    #[test]
    fn test_missing_answer_fields_is_format_error() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let record = AnnotationRecord::with_question(["what"]);
        assert!(matches!(encode(&enc, &record), Err(VqaError::Format(_))));
    }

    #[test]
    fn test_copy_only_list_is_format_error() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.valid_answers = Some(strings(&[COPY_TOKEN]));
        assert!(matches!(encode(&enc, &record), Err(VqaError::Format(_))));
    }

    #[test]
    fn test_skip_answers_needs_no_answer_fields() {
        let enc = encoder(EncoderConfig::new("vqa2", 4).with_answers(AnswerMode::Skip));
        let record = AnnotationRecord::with_question(["what"]);
        let sample = encode(&enc, &record).unwrap();
        assert_eq!(sample.answers, AnswerTargets::Unlabelled);
    }

    #[test]
    fn test_layout_pruned_and_assembled() {
        let modules = VocabularyIndex::from_tokens(["<eos>", "_Find", "_Filter", "_Describe"]).unwrap();
        let layout = LayoutMode::Supervised {
            t_decoder: 4,
            prune_filter_module: true,
            assembler: Arc::new(ModuleAssembler::new(modules).unwrap()),
        };
        let enc = encoder(EncoderConfig::new("clevr", 4).with_layout(layout));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.answer = Some("red".into());
        record.gt_layout_tokens = Some(strings(&["_Find", "_Filter", "_Describe"]));

        let sample = encode(&enc, &record).unwrap();
        assert_eq!(sample.gt_layout, LayoutTarget::Supervised(vec![2, 4, 1, 1]));
    }

    #[test]
    fn test_layout_missing_tokens_is_format_error() {
        let modules = VocabularyIndex::from_tokens(["<eos>", "_Find"]).unwrap();
        let layout = LayoutMode::Supervised {
            t_decoder: 4,
            prune_filter_module: false,
            assembler: Arc::new(ModuleAssembler::new(modules).unwrap()),
        };
        let enc = encoder(EncoderConfig::new("clevr", 4).with_layout(layout));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.answer = Some("red".into());
        assert!(matches!(encode(&enc, &record), Err(VqaError::Format(_))));
    }

    #[test]
    fn test_features_merged_until_gap() {
        let enc = encoder(EncoderConfig::new("vqa2", 4));
        let mut record = AnnotationRecord::with_question(["what"]);
        record.answer = Some("red".into());

        let tensor = FeatureTensor::new([2, 2], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let mut features = FeatureSet::default();
        features.features.insert(feature_key(0), tensor.clone());
        features.features.insert(feature_key(2), tensor);
        features.info.insert(
            info_key(0),
            ImageInfo { max_bboxes: Some(2), bboxes: Some(vec![[0.0, 0.0, 1.0, 1.0]]) },
        );

        let sample = enc.encode(&record, &features, &mut rng()).unwrap();
        assert_eq!(sample.image_features.len(), 1);
        assert_eq!(sample.image_dim, Some(2));
        assert_eq!(sample.image_boxes.as_ref().map(Vec::len), Some(1));
    }
}
