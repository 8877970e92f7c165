// ============================================================
// Layer 4 — VQA Dataset
// ============================================================
// Random access over an annotation index:
//
//   get(i) → slot i + 1 in the index (slot 0 is the header)
//          → FeatureProvider::get(slot)
//          → ExampleEncoder::encode(record, features)
//          → Sample
//
// Construction is fail-fast: a wrong imdb version, a malformed
// vocabulary or an incomplete layout config aborts setup before
// any sample is produced.
//
// With fast_read every sample is encoded once during
// construction and served from memory afterwards. The random
// answer draws are then frozen for the lifetime of the dataset.

use burn::{data::dataset::Dataset, prelude::*};
use rand::Rng;
use std::sync::Arc;

use crate::data::{
    batcher::{VqaBatch, VqaBatcher},
    config::{DatasetConfig, FeatureProviderConfig},
    encoder::{AnswerMode, EncoderConfig, ExampleEncoder, LayoutMode},
    imdb::{JsonAnnotationIndex, IMDB_VERSION},
    layout::ModuleAssembler,
    source::VqaSource,
    vocab::VocabularyIndex,
};
use crate::domain::{
    sample::Sample,
    traits::{AnnotationIndex, FeatureProvider},
};
use crate::error::{Result, VqaError};
use crate::ml::{
    evalai::{self, EvalAiPrediction},
    loss::{logit_bce, vqa_accuracy, LossAndMetrics},
};

/// Slot 0 of the annotation index holds the header.
pub const FIRST_ELEMENT_IDX: usize = 1;

pub struct VqaDataset<P: FeatureProvider = Box<dyn FeatureProvider>> {
    name: String,
    index: Box<dyn AnnotationIndex>,
    features: P,
    encoder: ExampleEncoder,
    cache: Option<Vec<Sample>>,
}

impl<P: FeatureProvider> VqaDataset<P> {
    /// Load the JSON imdb named by the config, then build the dataset.
    pub fn open<F>(config: &DatasetConfig, build_features: F) -> Result<Self>
    where
        F: FnOnce(FeatureProviderConfig) -> Result<P>,
    {
        let index = JsonAnnotationIndex::from_file(config.resolve(&config.imdb_file))?;
        Self::new(config, index, build_features)
    }

    pub fn new<I, F>(config: &DatasetConfig, index: I, build_features: F) -> Result<Self>
    where
        I: AnnotationIndex + 'static,
        F: FnOnce(FeatureProviderConfig) -> Result<P>,
    {
        config.validate()?;
        check_version(&index)?;

        // The answer vocabulary is loaded even when answers are skipped:
        // metrics and eval output still need the answer space.
        let answer_vocab = Arc::new(VocabularyIndex::from_file(config.resolve(&config.vocab_answer))?);
        let text_vocab = Arc::new(VocabularyIndex::from_file(config.resolve(&config.vocab_question))?);

        let layout = match config.layout_settings()? {
            Some(settings) => LayoutMode::Supervised {
                t_decoder: settings.t_decoder,
                prune_filter_module: settings.prune_filter_module,
                assembler: Arc::new(ModuleAssembler::from_file(&settings.assembler)?),
            },
            None => LayoutMode::Disabled,
        };
        let answers = if config.load_answer { AnswerMode::Load } else { AnswerMode::Skip };

        let encoder_config = EncoderConfig::new(&config.name, config.t_encoder)
            .with_answers(answers)
            .with_layout(layout);
        let encoder = ExampleEncoder::new(encoder_config, text_vocab, answer_vocab);

        let features = build_features(config.feature_config())?;

        tracing::info!(
            "Dataset '{}' ({}): answer space {}, question vocab {}",
            config.name,
            config.dataset_type,
            encoder.answer_vocab().size(),
            encoder.text_vocab().size()
        );

        Self::from_parts(index, features, encoder, config.fast_read)
    }

    /// Assemble a dataset from ready-made collaborators.
    pub fn from_parts<I>(index: I, features: P, encoder: ExampleEncoder, fast_read: bool) -> Result<Self>
    where
        I: AnnotationIndex + 'static,
    {
        check_version(&index)?;

        let mut dataset = Self {
            name: encoder.config().dataset_name.clone(),
            index: Box::new(index),
            features,
            encoder,
            cache: None,
        };

        if fast_read {
            dataset.cache = Some(dataset.materialise()?);
        }
        Ok(dataset)
    }

    fn materialise(&self) -> Result<Vec<Sample>> {
        tracing::info!("Fast read: caching {} samples of '{}'", self.len(), self.name);
        let mut rng = rand::thread_rng();
        (0..self.len()).map(|i| self.load_item(i, &mut rng)).collect()
    }

    /// Number of usable records (header slot excluded).
    pub fn len(&self) -> usize {
        self.index.len().saturating_sub(FIRST_ELEMENT_IDX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> Result<Sample> {
        self.get_with_rng(idx, &mut rand::thread_rng())
    }

    /// Like `get`, with caller-provided randomness for the answer draws.
    pub fn get_with_rng<R: Rng + ?Sized>(&self, idx: usize, rng: &mut R) -> Result<Sample> {
        if idx >= self.len() {
            return Err(VqaError::Index { index: idx, len: self.len() });
        }
        match &self.cache {
            Some(cache) => Ok(cache[idx].clone()),
            None => self.load_item(idx, rng),
        }
    }

    fn load_item<R: Rng + ?Sized>(&self, idx: usize, rng: &mut R) -> Result<Sample> {
        let slot = idx + FIRST_ELEMENT_IDX;
        let record = self
            .index
            .record(slot)
            .ok_or_else(|| VqaError::format(format!("imdb slot {slot} holds no record")))?;
        let features = self.features.get(slot)?;
        self.encoder.encode(record, &features, rng)
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn encoder(&self) -> &ExampleEncoder {
        &self.encoder
    }
}

fn check_version(index: &dyn AnnotationIndex) -> Result<()> {
    let observed = index.version();
    if observed != IMDB_VERSION {
        tracing::error!(
            "Observed imdb version {}, expected imdb version {}",
            observed,
            IMDB_VERSION
        );
        return Err(VqaError::VersionMismatch { expected: IMDB_VERSION, observed });
    }
    Ok(())
}

impl<P: FeatureProvider> VqaSource for VqaDataset<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn text_vocab(&self) -> &Arc<VocabularyIndex> {
        self.encoder.text_vocab()
    }

    fn answer_vocab(&self) -> &Arc<VocabularyIndex> {
        self.encoder.answer_vocab()
    }

    fn answer_space_size(&self) -> usize {
        self.encoder.answer_vocab().size()
    }

    fn batcher<B: Backend>(&self, device: B::Device) -> VqaBatcher<B> {
        VqaBatcher::new(device)
    }

    fn calculate_loss_and_metrics<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        batch: &VqaBatch<B>,
    ) -> Result<LossAndMetrics<B>> {
        let answers = batch
            .answers
            .as_ref()
            .ok_or_else(|| VqaError::format("batch carries no answer targets"))?;

        let accuracy = vqa_accuracy(logits.clone(), answers.scores.clone());
        let loss = logit_bce(logits, answers.scores.clone());
        Ok(LossAndMetrics { loss, accuracy })
    }

    fn verbose_dump<B: Backend>(&self, batch: &VqaBatch<B>, logits: Tensor<B, 2>) -> Result<Vec<String>> {
        let predictions = evalai::decode_answers(self.answer_vocab(), logits)?;
        for (expected, prediction) in batch.raw_answers.iter().zip(&predictions) {
            tracing::info!("Expected {:?} | Prediction {}", expected, prediction);
        }
        Ok(predictions)
    }

    fn format_for_evalai<B: Backend>(
        &self,
        batch: &VqaBatch<B>,
        logits: Tensor<B, 2>,
    ) -> Result<Vec<EvalAiPrediction>> {
        evalai::format_for_evalai(self.answer_vocab(), &batch.question_ids, logits)
    }
}

// ─── Burn Dataset Trait Implementation ────────────────────────────────────────
// Burn's DataLoader expects Option; a failed sample is logged and skipped.
impl<P: FeatureProvider> Dataset<Sample> for VqaDataset<P> {
    fn get(&self, index: usize) -> Option<Sample> {
        match VqaDataset::get(self, index) {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::warn!("Skipping sample {} of '{}': {}", index, self.name, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        VqaDataset::len(self)
    }
}
