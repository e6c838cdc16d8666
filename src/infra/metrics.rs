// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean pointer cross-entropy over training batches
//   - val_loss:   mean pointer cross-entropy on the validation set
//   - f1:         SQuAD token F1 on the evaluation sample
//   - em:         SQuAD exact match on the evaluation sample
//
// Output file: {train_dir}/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,val_loss,f1,em
//   1,5.124500,5.089200,0.183000,0.112000
//   2,4.390100,4.454300,0.241000,0.164000
//
// Rows are appended, so a resumed run continues the same file.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

pub const CSV_HEADER: &str = "epoch,train_loss,val_loss,f1,em";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub val_loss:   f64,
    /// Range [0.0, 1.0]
    pub f1:         f64,
    /// Range [0.0, 1.0]
    pub em:         f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, f1: f64, em: f64) -> Self {
        Self { epoch, train_loss, val_loss, f1, em }
    }

    /// True if this epoch beat the best validation F1 so far.
    pub fn is_improvement(&self, best_f1: f64) -> bool {
        self.f1 > best_f1
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{CSV_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.f1,
            m.em,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}, f1={:.4}, em={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.f1,
            m.em,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
