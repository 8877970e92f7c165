// ============================================================
// Layer 6 — Metrics
// ============================================================
// VqaMeter accumulates loss and soft accuracy over the batches
// of one pass; MetricsLogger appends one CSV row per report.
//
// Averages are weighted by batch size, so a short final batch
// does not count as much as a full one.
//
// Example CSV output:
//   step,split,samples,loss,accuracy
//   0,vqa2,40504,3.124500,0.412000
//   0,all,50504,3.089200,0.398000

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::ml::loss::LossAndMetrics;

/// Averages over everything seen since the last reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterReport {
    pub samples: usize,
    pub loss: f64,
    pub accuracy: f64,
}

/// Batch-size-weighted running sums of loss and accuracy.
#[derive(Debug, Clone, Default)]
pub struct VqaMeter {
    samples: usize,
    loss_sum: f64,
    accuracy_sum: f64,
}

impl VqaMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `loss` and `accuracy` are batch means.
    pub fn update(&mut self, loss: f64, accuracy: f64, batch_size: usize) {
        self.samples += batch_size;
        self.loss_sum += loss * batch_size as f64;
        self.accuracy_sum += accuracy * batch_size as f64;
    }

    /// Same as `update`, reading the loss out of a scalar tensor.
    pub fn update_with<B: Backend>(&mut self, result: &LossAndMetrics<B>, batch_size: usize) {
        let loss = result.loss.clone().into_scalar().elem::<f64>();
        self.update(loss, result.accuracy, batch_size);
    }

    pub fn report(&self) -> MeterReport {
        if self.samples == 0 {
            return MeterReport { samples: 0, loss: 0.0, accuracy: 0.0 };
        }
        let n = self.samples as f64;
        MeterReport { samples: self.samples, loss: self.loss_sum / n, accuracy: self.accuracy_sum / n }
    }

    /// Start a fresh pass.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Appends meter reports to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "step,split,samples,loss,accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// `step` is whatever position the caller reports at (epoch, window start, ...).
    pub fn log(&self, step: usize, split: &str, report: &MeterReport) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{:.6},{:.6}",
            step, split, report.samples, report.loss, report.accuracy
        )?;

        tracing::debug!(
            "Logged step {} {}: loss={:.4}, accuracy={:.4}",
            step,
            split,
            report.loss,
            report.accuracy
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
