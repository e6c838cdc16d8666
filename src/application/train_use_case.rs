// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Write flags.json            (Layer 2)
//   Step 2: Load vocabulary             (Layer 6 - infra)
//   Step 3: Load word vectors           (Layer 6 - infra)
//   Step 4: Load train/val splits       (Layer 4 - data)
//   Step 5: Pad into datasets           (Layer 4 - data)
//   Step 6: Save configs + tokenizer    (Layer 6 - infra)
//   Step 7: Run training loop           (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::data::{
    dataset::QaDataset,
    loader::SquadLoader,
    splitter::split_train_val,
};
use crate::domain::qa_pair::QaPair;
use crate::domain::span::PointerMode;
use crate::domain::traits::DatasetSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    embeddings::load_embeddings,
    tokenizer_store::TokenizerStore,
    vocab::Vocabulary,
};
use crate::ml::model::QaSystemConfig;
use crate::ml::trainer::{run_training, TrainReport};

/// Fraction of "train" kept for training when there is no "val" split.
const TRAIN_FRACTION: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All flags of a training run. Saved as train_config.json next to
// the checkpoints and as flags.json in the log dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub learning_rate:       f64,
    pub max_gradient_norm:   f32,
    pub dropout:             f64,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub state_size:          usize,
    pub embedding_size:      usize,
    pub data_dir:            String,
    pub train_dir:           String,
    /// Checkpoint to resume from; empty means `train_dir`
    pub load_train_dir:      String,
    pub log_dir:             String,
    pub optimizer:           OptimizerKind,
    /// Log every n batches; 0 disables per-batch logging
    pub print_every:         usize,
    /// Newest checkpoints to keep; 0 keeps all
    pub keep:                usize,
    pub vocab_path:          String,
    /// Empty means {data_dir}/glove.trimmed.{embedding_size}.npz
    pub embed_path:          String,
    pub max_question_length: usize,
    pub max_context_length:  usize,
    pub max_answer_length:   usize,
    /// Validation examples scored for F1/EM each epoch; 0 = all
    pub evaluate:            usize,
    /// Per-epoch learning rate multiplier
    pub lr_decay:            f64,
    pub pointer_mode:        PointerMode,
    pub train_embeddings:    bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate:       0.01,
            max_gradient_norm:   10.0,
            dropout:             0.15,
            batch_size:          10,
            epochs:              10,
            state_size:          200,
            embedding_size:      100,
            data_dir:            "data/squad".to_string(),
            train_dir:           "train".to_string(),
            load_train_dir:      String::new(),
            log_dir:             "log".to_string(),
            optimizer:           OptimizerKind::Adam,
            print_every:         1,
            keep:                0,
            vocab_path:          "data/squad/vocab.dat".to_string(),
            embed_path:          String::new(),
            max_question_length: 20,
            max_context_length:  200,
            max_answer_length:   15,
            evaluate:            100,
            lr_decay:            1.0,
            pointer_mode:        PointerMode::Boundary,
            train_embeddings:    false,
        }
    }
}

impl TrainConfig {
    pub fn embed_path(&self) -> PathBuf {
        if self.embed_path.is_empty() {
            Path::new(&self.data_dir).join(format!("glove.trimmed.{}.npz", self.embedding_size))
        } else {
            PathBuf::from(&self.embed_path)
        }
    }

    pub fn load_train_dir(&self) -> &str {
        if self.load_train_dir.is_empty() { &self.train_dir } else { &self.load_train_dir }
    }

    /// Learning rate for a 1-based epoch.
    pub fn learning_rate_at(&self, epoch: usize) -> f64 {
        self.learning_rate * self.lr_decay.powi(epoch.saturating_sub(1) as i32)
    }

    pub fn model_config(&self, vocab_size: usize) -> QaSystemConfig {
        QaSystemConfig::new(
            vocab_size,
            self.embedding_size,
            self.state_size,
            self.max_question_length,
            self.max_context_length,
        )
        .with_max_answer_length(self.max_answer_length)
        .with_pointer_mode(self.pointer_mode)
        .with_dropout(self.dropout)
        .with_train_embeddings(self.train_embeddings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.max_question_length == 0 || self.max_context_length == 0 {
            bail!("max_question_length and max_context_length must be positive");
        }
        if self.max_answer_length == 0 {
            bail!("max_answer_length must be at least 1");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Record the flags of this run ──────────────────────────────
        write_flags(cfg)?;

        // ── Step 2: Vocabulary ────────────────────────────────────────────────
        let vocab = Vocabulary::load(&cfg.vocab_path)?;

        // ── Step 3: Pretrained word vectors ───────────────────────────────────
        let embed_path = cfg.embed_path();
        let embeddings = load_embeddings(&embed_path, &vocab, cfg.embedding_size, &mut rand::thread_rng())
            .with_context(|| format!("Loading word vectors from '{}'", embed_path.display()))?;

        // ── Step 4: Train / validation splits ─────────────────────────────────
        let loader = SquadLoader::new(&cfg.data_dir).with_vocab_size(vocab.len());
        let (train_pairs, val_pairs) = load_splits(&loader)?;

        // ── Step 5: Burn datasets ─────────────────────────────────────────────
        let train_dataset = QaDataset::for_training(&train_pairs, cfg.max_question_length, cfg.max_context_length);
        let val_dataset   = QaDataset::for_training(&val_pairs, cfg.max_question_length, cfg.max_context_length);
        tracing::info!(
            "Datasets: {} train, {} validation",
            train_dataset.sample_count(),
            val_dataset.sample_count()
        );
        if train_dataset.sample_count() == 0 {
            bail!("No usable training examples in '{}'", cfg.data_dir);
        }

        // ── Step 6: Save what inference needs ─────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.train_dir)?;
        ckpt.save_config(cfg)?;
        ckpt.save_model_config(&cfg.model_config(vocab.len()))?;
        TokenizerStore::new(&cfg.train_dir).build_and_save(&vocab)?;

        // ── Step 7: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, &vocab, &embeddings, train_dataset, val_dataset, ckpt)
    }
}

fn write_flags(cfg: &TrainConfig) -> Result<()> {
    fs::create_dir_all(&cfg.log_dir)
        .with_context(|| format!("Cannot create log dir '{}'", cfg.log_dir))?;
    let path = Path::new(&cfg.log_dir).join("flags.json");
    fs::write(&path, serde_json::to_string_pretty(cfg)?)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::info!("Flags: {}", serde_json::to_string(cfg)?);
    Ok(())
}

/// "train" plus "val" when present; otherwise "train" is split.
fn load_splits(loader: &impl DatasetSource) -> Result<(Vec<QaPair>, Vec<QaPair>)> {
    let train = loader.load_split("train")?;
    if loader.has_split("val") {
        Ok((train, loader.load_split("val")?))
    } else {
        tracing::info!("No 'val' split found, holding out {:.0}% of train", (1.0 - TRAIN_FRACTION) * 100.0);
        Ok(split_train_val(train, TRAIN_FRACTION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::span::AnswerSpan;

    struct InMemory {
        train: Vec<QaPair>,
        val:   Option<Vec<QaPair>>,
    }

    impl DatasetSource for InMemory {
        fn load_split(&self, split: &str) -> Result<Vec<QaPair>> {
            match (split, &self.val) {
                ("train", _)     => Ok(self.train.clone()),
                ("val", Some(v)) => Ok(v.clone()),
                _                => bail!("no split {split}"),
            }
        }

        fn has_split(&self, split: &str) -> bool {
            split == "train" || (split == "val" && self.val.is_some())
        }
    }

    fn pairs(n: usize) -> Vec<QaPair> {
        (0..n).map(|i| QaPair::new(vec![i as u32], vec![1, 2], Some(AnswerSpan::new(0, 0)))).collect()
    }

    #[test]
    fn test_defaults_follow_flag_table() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.learning_rate, 0.01);
        assert_eq!(cfg.batch_size, 10);
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.embed_path(), PathBuf::from("data/squad/glove.trimmed.100.npz"));
        assert_eq!(cfg.load_train_dir(), "train");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_learning_rate_decays_per_epoch() {
        let cfg = TrainConfig { lr_decay: 0.5, ..TrainConfig::default() };
        assert!((cfg.learning_rate_at(1) - 0.01).abs() < 1e-12);
        assert!((cfg.learning_rate_at(3) - 0.0025).abs() < 1e-12);
    }

    #[test]
    fn test_model_config_carries_flags() {
        let cfg = TrainConfig { pointer_mode: PointerMode::Sequence, ..TrainConfig::default() };
        let m   = cfg.model_config(500);
        assert_eq!(m.vocab_size, 500);
        assert_eq!(m.pointer_steps(), 16);
        assert_eq!(m.state_size, 200);
    }

    #[test]
    fn test_splits_use_val_when_present() {
        let source = InMemory { train: pairs(10), val: Some(pairs(3)) };
        let (train, val) = load_splits(&source).unwrap();
        assert_eq!((train.len(), val.len()), (10, 3));

        let source = InMemory { train: pairs(10), val: None };
        let (train, val) = load_splits(&source).unwrap();
        assert_eq!((train.len(), val.len()), (9, 1));
    }

    #[test]
    fn test_config_json_round_trip_uses_lowercase_names() {
        let json = serde_json::to_string(&TrainConfig::default()).unwrap();
        assert!(json.contains("\"optimizer\":\"adam\""));
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_context_length, 200);
    }
}
