// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a trained checkpoint on one split:
//
//   Step 1: Restore model + config     (Layer 6 - infra)
//   Step 2: Load and pad the split     (Layer 4 - data)
//   Step 3: Predict spans, score F1/EM (Layer 5 - ml)
//
// Every labelled example is scored, including those whose answer
// lies past max_context_length; those count against the model.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::{dataset::QaSample, loader::SquadLoader, splitter::sample_subset};
use crate::domain::scoring::ScoreSummary;
use crate::domain::traits::DatasetSource;
use crate::infra::{checkpoint::CheckpointManager, vocab::Vocabulary};
use crate::ml::predictor::Predictor;

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data_dir:   String,
    pub train_dir:  String,
    pub vocab_path: String,
    pub split:      String,
    /// Examples to score; 0 = the whole split
    pub sample:     usize,
    pub batch_size: usize,
}

pub struct EvaluateUseCase<B: Backend> {
    config: EvaluateConfig,
    device: B::Device,
}

impl<B: Backend> EvaluateUseCase<B> {
    pub fn new(config: EvaluateConfig, device: B::Device) -> Self {
        Self { config, device }
    }

    pub fn execute(&self) -> Result<ScoreSummary> {
        let cfg = &self.config;

        // ── Step 1: Restore the trained model ─────────────────────────────────
        let ckpt = CheckpointManager::open(&cfg.train_dir);
        if !ckpt.has_checkpoint() {
            bail!("No checkpoint in '{}'. Run 'train' first.", cfg.train_dir);
        }
        let predictor = Predictor::<B>::from_checkpoint(&ckpt, self.device.clone())?;
        let vocab     = Vocabulary::load(&cfg.vocab_path)?;

        // ── Step 2: Load the split ────────────────────────────────────────────
        let pairs = SquadLoader::new(&cfg.data_dir)
            .with_vocab_size(predictor.config.vocab_size.min(vocab.len()))
            .load_split(&cfg.split)?;
        let samples: Vec<QaSample> = pairs
            .iter()
            .map(|p| QaSample::from_pair(
                p,
                predictor.config.max_question_length,
                predictor.config.max_context_length,
            ))
            .collect();
        let samples = sample_subset(&samples, cfg.sample);

        // ── Step 3: Predict and score ─────────────────────────────────────────
        let summary = predictor.score(&samples, &vocab, cfg.batch_size)?;
        tracing::info!(
            "Split '{}': F1={:.2}% EM={:.2}% over {} labelled examples",
            cfg.split,
            summary.f1 * 100.0,
            summary.em * 100.0,
            summary.count
        );
        Ok(summary)
    }
}
