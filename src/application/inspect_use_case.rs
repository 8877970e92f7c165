// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Builds every dataset named in a run config and reads back a
// window of encoded samples for manual inspection:
//
//   Step 1: Load the run config          (Layer 2)
//   Step 2: Build + concatenate datasets (Layer 4 - data)
//   Step 3: Encode the requested samples (Layer 4 - data)
//   Step 4: Oracle metrics on the window (Layer 5 - ml, Layer 6 - infra)
//   Step 5: Append metrics rows          (Layer 6 - infra, optional)
//
// The oracle pass feeds the answer scores back in as logits,
// which gives the best soft accuracy any model could reach on
// those samples. It is reported per constituent dataset and
// over the whole window, and skipped when any sample is
// unlabelled.

use anyhow::{Context, Result};
use burn::{backend::NdArray, data::dataloader::batcher::Batcher};
use serde::Serialize;
use std::path::PathBuf;

use crate::application::{config::RunConfig, registry::DatasetRegistry};
use crate::data::{concat::ConcatenatedDatasetView, source::VqaSource};
use crate::domain::sample::Sample;
use crate::infra::metrics::{MeterReport, MetricsLogger, VqaMeter};
use crate::ml::loss::LossAndMetrics;

/// Split label of the whole-window oracle row.
pub const WINDOW_SPLIT: &str = "all";

#[derive(Debug, Clone)]
pub struct InspectConfig {
    /// Run config JSON listing the datasets
    pub config_path: PathBuf,

    /// First global sample index
    pub start: usize,

    /// Window size; clipped at the end of the view
    pub count: usize,

    /// When set, oracle rows are appended to `<dir>/metrics.csv`
    pub metrics_dir: Option<PathBuf>,
}

/// Oracle metrics for the part of the window one dataset served.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetOracle {
    pub dataset: String,
    pub report: MeterReport,
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    /// Name of the representative (first) dataset
    pub dataset: String,

    /// Samples across all constituents
    pub total: usize,

    pub answer_space: usize,

    pub samples: Vec<Sample>,

    /// Whole-window oracle; None when any sample is unlabelled
    pub oracle: Option<MeterReport>,

    /// One entry per constituent the window touched, in order
    pub oracle_by_dataset: Vec<DatasetOracle>,
}

pub struct InspectUseCase {
    config: InspectConfig,
    registry: DatasetRegistry,
}

impl InspectUseCase {
    pub fn new(config: InspectConfig) -> Self {
        Self { config, registry: DatasetRegistry::default() }
    }

    pub fn execute(&self) -> Result<InspectReport> {
        let cfg = &self.config;

        // ── Step 1: Load the run config ──────────────────────────────────────
        let run = RunConfig::from_file(&cfg.config_path)?;

        // ── Step 2: Build and concatenate ────────────────────────────────────
        let view = self
            .registry
            .build_all(&run.datasets)
            .context("Failed to build datasets")?;
        tracing::info!("Serving {} samples from '{}'", view.len(), view.name());

        // ── Step 3: Encode the window, grouped by constituent ────────────────
        let end = cfg.start.saturating_add(cfg.count).min(view.len());
        let mut groups: Vec<(usize, Vec<Sample>)> = Vec::new();
        for i in cfg.start..end {
            let (position, _) = view.locate(i)?;
            let sample = view.get(i).with_context(|| format!("Failed to load sample {i}"))?;
            match groups.last_mut() {
                Some((last, group)) if *last == position => group.push(sample),
                _ => groups.push((position, vec![sample])),
            }
        }

        // ── Step 4: Oracle metrics ───────────────────────────────────────────
        let all_labelled = groups
            .iter()
            .flat_map(|(_, group)| group)
            .all(|s| s.answers.labelled().is_some());

        let mut oracle = None;
        let mut oracle_by_dataset = Vec::new();
        if !groups.is_empty() && all_labelled {
            let mut total = VqaMeter::new();
            let mut meter = VqaMeter::new();
            for (position, group) in &groups {
                let (result, batch_size) = oracle_batch(&view, group.clone())?;
                meter.update_with(&result, batch_size);
                total.update_with(&result, batch_size);

                oracle_by_dataset.push(DatasetOracle {
                    dataset: view.datasets()[*position].name().to_string(),
                    report: meter.report(),
                });
                meter.reset();
            }
            oracle = Some(total.report());
        }

        // ── Step 5: Append metrics rows ──────────────────────────────────────
        if let (Some(dir), Some(window)) = (&cfg.metrics_dir, &oracle) {
            let logger = MetricsLogger::new(dir)?;
            for entry in &oracle_by_dataset {
                logger.log(cfg.start, &entry.dataset, &entry.report)?;
            }
            logger.log(cfg.start, WINDOW_SPLIT, window)?;
            tracing::info!("Oracle metrics appended to '{}'", logger.csv_path().display());
        }

        Ok(InspectReport {
            dataset: view.name().to_string(),
            total: view.len(),
            answer_space: view.answer_space_size(),
            samples: groups.into_iter().flat_map(|(_, group)| group).collect(),
            oracle,
            oracle_by_dataset,
        })
    }
}

/// Batch one group and score it with its own targets as logits.
fn oracle_batch(
    view: &ConcatenatedDatasetView,
    samples: Vec<Sample>,
) -> Result<(LossAndMetrics<NdArray>, usize)> {
    let batch = view.batcher::<NdArray>(Default::default()).batch(samples);
    let scores = batch
        .answers
        .as_ref()
        .map(|a| a.scores.clone())
        .context("Labelled batch lost its scores")?;
    let result = view.calculate_loss_and_metrics(scores, &batch)?;
    Ok((result, batch.batch_size()))
}
