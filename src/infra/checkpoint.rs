// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores QaSystem weights using Burn's CompactRecorder.
//
// What gets saved:
//   1. Model weights per epoch   — all learned parameters
//   2. latest_epoch.json         — which epoch was last saved
//   3. model_config.json         — QaSystemConfig, to rebuild the model
//   4. train_config.json         — the run's TrainConfig
//
// File naming convention:
//   train/
//     model_epoch_1.mpk      ← weights after epoch 1
//     model_epoch_2.mpk      ← weights after epoch 2
//     ...
//     latest_epoch.json
//     model_config.json
//     train_config.json
//
// With keep > 0 only the newest `keep` weight files survive each
// save; keep = 0 retains them all.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    config::Config,
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{QaSystem, QaSystemConfig};

const LATEST_EPOCH: &str = "latest_epoch.json";
const MODEL_CONFIG: &str = "model_config.json";
const TRAIN_CONFIG: &str = "train_config.json";
const WEIGHTS_PREFIX: &str = "model_epoch_";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Read-only handle; the directory may not exist.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// True if a model can be restored from this directory.
    pub fn has_checkpoint(&self) -> bool {
        self.dir.join(LATEST_EPOCH).exists() && self.dir.join(MODEL_CONFIG).exists()
    }

    /// Save weights for `epoch`, point latest_epoch.json at it and
    /// prune old epochs down to `keep` (0 keeps everything).
    pub fn save_model<B: Backend>(
        &self,
        model: &QaSystem<B>,
        epoch: usize,
        keep:  usize,
    ) -> Result<()> {
        let path = self.dir.join(format!("{WEIGHTS_PREFIX}{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let latest_path = self.dir.join(LATEST_EPOCH);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {LATEST_EPOCH}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);

        if keep > 0 {
            self.prune(keep)?;
        }
        Ok(())
    }

    /// Restore weights from the newest epoch into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  QaSystem<B>,
        device: &B::Device,
    ) -> Result<QaSystem<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("{WEIGHTS_PREFIX}{epoch}"));

        tracing::info!("Loading checkpoint from epoch {} in '{}'", epoch, self.dir.display());

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Rebuild the model from model_config.json and load the newest weights.
    pub fn restore<B: Backend>(&self, device: &B::Device) -> Result<(QaSystem<B>, QaSystemConfig)> {
        let config = self.load_model_config()?;
        let model  = self.load_model(config.init::<B>(device), device)?;
        Ok((model, config))
    }

    pub fn save_model_config(&self, cfg: &QaSystemConfig) -> Result<()> {
        let path = self.dir.join(MODEL_CONFIG);
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_model_config(&self) -> Result<QaSystemConfig> {
        let path = self.dir.join(MODEL_CONFIG);
        QaSystemConfig::load(&path)
            .with_context(|| {
                format!(
                    "Cannot read model config from '{}'. \
                     Make sure you have run 'train' first.",
                    path.display()
                )
            })
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(TRAIN_CONFIG);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// The epoch latest_epoch.json points at.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_EPOCH);

        let s = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot find '{}'. Have you run 'train' first?", path.display())
            })?;

        serde_json::from_str::<usize>(s.trim())
            .with_context(|| format!("Malformed '{}'", path.display()))
    }

    /// Epoch numbers that have weight files on disk, ascending.
    pub fn saved_epochs(&self) -> Result<Vec<usize>> {
        let mut epochs: Vec<usize> = self
            .weight_files()?
            .into_iter()
            .map(|(epoch, _)| epoch)
            .collect();
        epochs.sort_unstable();
        epochs.dedup();
        Ok(epochs)
    }

    fn weight_files(&self) -> Result<Vec<(usize, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read '{}'", self.dir.display()))?
        {
            let path = entry?.path();
            let epoch = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(WEIGHTS_PREFIX))
                .and_then(|rest| rest.split('.').next())
                .and_then(|num| num.parse::<usize>().ok());
            if let Some(epoch) = epoch {
                files.push((epoch, path));
            }
        }
        Ok(files)
    }

    fn prune(&self, keep: usize) -> Result<()> {
        let epochs = self.saved_epochs()?;
        if epochs.len() <= keep {
            return Ok(());
        }
        let cutoff = epochs[epochs.len() - keep];
        for (epoch, path) in self.weight_files()? {
            if epoch < cutoff {
                fs::remove_file(&path)
                    .with_context(|| format!("Cannot remove '{}'", path.display()))?;
                tracing::debug!("Pruned checkpoint '{}'", path.display());
            }
        }
        Ok(())
    }
}
