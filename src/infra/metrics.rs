// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one csv row per training epoch to
// <checkpoint_dir>/metrics.csv:
//
//   epoch,train_loss,valid_loss,valid_rocauc
//   1,0.412300,0.198100,0.612000
//   2,0.171200,0.160400,0.655400
//
// valid_rocauc is left empty when the validation split holds a
// single class.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: [&str; 4] = ["epoch", "train_loss", "valid_loss", "valid_rocauc"];

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean binary cross-entropy over the epoch's training batches
    pub train_loss: f64,

    /// Binary cross-entropy over the whole validation split
    pub valid_loss: f64,

    pub valid_rocauc: Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, valid_loss: f64, valid_rocauc: Option<f64>) -> Self {
        Self { epoch, train_loss, valid_loss, valid_rocauc }
    }

    /// Higher validation ROC-AUC wins. An epoch with a score beats one
    /// without. Equal or missing scores fall back to lower validation
    /// loss, and a full tie keeps the earlier epoch.
    pub fn is_improvement_over(&self, best: &EpochMetrics) -> bool {
        match (self.valid_rocauc, best.valid_rocauc) {
            (Some(cur), Some(prev)) if cur == prev => self.valid_loss < best.valid_loss,
            (Some(cur), Some(prev)) => cur > prev,
            (Some(_), None)         => true,
            (None, Some(_))         => false,
            (None, None)            => self.valid_loss < best.valid_loss,
        }
    }
}

/// Logs epoch metrics to a csv file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file does not exist yet, so repeated
    /// runs append to one log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut w = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            w.write_record(HEADER)?;
            w.flush()?;
            tracing::debug!("Created metrics csv: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        w.write_record([
            m.epoch.to_string(),
            format!("{:.6}", m.train_loss),
            format!("{:.6}", m.valid_loss),
            m.valid_rocauc.map(|v| format!("{:.6}", v)).unwrap_or_default(),
        ])?;
        w.flush()?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, valid_loss={:.4}",
            m.epoch, m.train_loss, m.valid_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
