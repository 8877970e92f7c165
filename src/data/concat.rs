// ============================================================
// Layer 4 — Concatenated Dataset View
// ============================================================
// Several VqaDatasets behind one contiguous index range:
//
//   global 0 ........ len(D1)-1 | len(D1) ..... len(D1)+len(D2)-1
//          └──────── D1 ───────┘ └──────────── D2 ──────────────┘
//
// Samples come from whichever constituent owns the index. All
// metadata (vocabularies, loss, eval formatting) is forwarded to
// the first constituent, so every constituent must share its
// vocabularies and its sample shapes (T_encoder, valid-answer
// capacity, T_decoder).

use burn::{data::dataset::Dataset, prelude::*};
use rand::Rng;
use std::sync::Arc;

use crate::data::{
    batcher::{VqaBatch, VqaBatcher},
    dataset::VqaDataset,
    source::VqaSource,
    vocab::VocabularyIndex,
};
use crate::domain::{sample::Sample, traits::FeatureProvider};
use crate::error::{Result, VqaError};
use crate::ml::{evalai::EvalAiPrediction, loss::LossAndMetrics};

pub struct ConcatenatedDatasetView<P: FeatureProvider = Box<dyn FeatureProvider>> {
    datasets: Vec<VqaDataset<P>>,
    /// Exclusive end of each constituent's global range.
    ends: Vec<usize>,
}

impl<P: FeatureProvider> ConcatenatedDatasetView<P> {
    pub fn new(datasets: Vec<VqaDataset<P>>) -> Result<Self> {
        let Some(first) = datasets.first() else {
            return Err(VqaError::config("cannot concatenate an empty list of datasets"));
        };

        // Batches are prepared by the first constituent, so every sample
        // must match its vocabularies and tensor widths.
        let first_shape = first.encoder().config().sample_shape();
        for other in &datasets[1..] {
            if other.text_vocab() != first.text_vocab() || other.answer_vocab() != first.answer_vocab() {
                return Err(VqaError::config(format!(
                    "dataset '{}' does not share the vocabularies of '{}'",
                    other.name(),
                    first.name()
                )));
            }
            let other_shape = other.encoder().config().sample_shape();
            if other_shape != first_shape {
                return Err(VqaError::config(format!(
                    "dataset '{}' encodes (T_encoder, valid answers, T_decoder) = {:?}, '{}' encodes {:?}",
                    other.name(),
                    other_shape,
                    first.name(),
                    first_shape
                )));
            }
        }

        let ends = datasets
            .iter()
            .scan(0, |total, d| {
                *total += d.len();
                Some(*total)
            })
            .collect();

        tracing::info!(
            "Concatenated {} datasets: [{}]",
            datasets.len(),
            datasets.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
        );
        Ok(Self { datasets, ends })
    }

    pub fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn datasets(&self) -> &[VqaDataset<P>] {
        &self.datasets
    }

    fn first(&self) -> &VqaDataset<P> {
        &self.datasets[0]
    }

    /// Constituent position and local index for a global index.
    pub fn locate(&self, index: usize) -> Result<(usize, usize)> {
        let position = self.ends.partition_point(|&end| end <= index);
        if position == self.datasets.len() {
            return Err(VqaError::Index { index, len: self.len() });
        }
        let start = if position == 0 { 0 } else { self.ends[position - 1] };
        Ok((position, index - start))
    }

    pub fn get(&self, index: usize) -> Result<Sample> {
        self.get_with_rng(index, &mut rand::thread_rng())
    }

    pub fn get_with_rng<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Result<Sample> {
        let (position, local) = self.locate(index)?;
        self.datasets[position].get_with_rng(local, rng)
    }
}

impl<P: FeatureProvider> VqaSource for ConcatenatedDatasetView<P> {
    fn name(&self) -> &str {
        self.first().name()
    }

    fn text_vocab(&self) -> &Arc<VocabularyIndex> {
        self.first().text_vocab()
    }

    fn answer_vocab(&self) -> &Arc<VocabularyIndex> {
        self.first().answer_vocab()
    }

    fn answer_space_size(&self) -> usize {
        self.first().answer_space_size()
    }

    fn batcher<B: Backend>(&self, device: B::Device) -> VqaBatcher<B> {
        self.first().batcher(device)
    }

    fn calculate_loss_and_metrics<B: Backend>(
        &self,
        logits: Tensor<B, 2>,
        batch: &VqaBatch<B>,
    ) -> Result<LossAndMetrics<B>> {
        self.first().calculate_loss_and_metrics(logits, batch)
    }

    fn verbose_dump<B: Backend>(&self, batch: &VqaBatch<B>, logits: Tensor<B, 2>) -> Result<Vec<String>> {
        self.first().verbose_dump(batch, logits)
    }

    fn format_for_evalai<B: Backend>(
        &self,
        batch: &VqaBatch<B>,
        logits: Tensor<B, 2>,
    ) -> Result<Vec<EvalAiPrediction>> {
        self.first().format_for_evalai(batch, logits)
    }
}

impl<P: FeatureProvider> Dataset<Sample> for ConcatenatedDatasetView<P> {
    fn get(&self, index: usize) -> Option<Sample> {
        match ConcatenatedDatasetView::get(self, index) {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::warn!("Skipping sample {}: {}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        ConcatenatedDatasetView::len(self)
    }
}
