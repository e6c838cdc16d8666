// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader.
//
// Per epoch:
//   1. lr = learning_rate · lr_decay^(epoch - 1)
//   2. train: forward_loss → backward → clipped optimiser step
//   3. validate: mean pointer loss over the validation set
//   4. score: F1/EM on a random sample of `evaluate` examples
//   5. checkpoint + metrics.csv row
//
// Backends:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns the model on MyInnerBackend (Wgpu),
//     with dropout off; validation batches use that backend too
//
// Resuming: if `load_train_dir` (or `train_dir`) holds a
// checkpoint, its weights are restored and the epoch count, and
// with it the decayed learning rate, continues after it. A
// checkpoint that exists but cannot be read stops the run.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{Context, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    module::{AutodiffModule, Module},
    optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::data::{batcher::QaBatcher, dataset::QaDataset, splitter::sample_subset};
use crate::infra::{
    checkpoint::CheckpointManager,
    embeddings::EmbeddingMatrix,
    metrics::{EpochMetrics, MetricsLogger},
    vocab::Vocabulary,
};
use crate::ml::model::{QaSystem, QaSystemConfig};
use crate::ml::predictor::score_samples;

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Outcome of a training run.
#[derive(Debug, Clone, Default)]
pub struct TrainReport {
    pub epochs_run:    usize,
    pub last:          Option<EpochMetrics>,
    pub best_f1:       f64,
    /// Learning rate of the last epoch run
    pub learning_rate: f64,
}

pub fn run_training(
    cfg:           &TrainConfig,
    vocab:         &Vocabulary,
    embeddings:    &EmbeddingMatrix,
    train_dataset: QaDataset,
    val_dataset:   QaDataset,
    ckpt_manager:  CheckpointManager,
) -> Result<TrainReport> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, vocab, embeddings, train_dataset, val_dataset, ckpt_manager, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    vocab:         &Vocabulary,
    embeddings:    &EmbeddingMatrix,
    train_dataset: QaDataset,
    val_dataset:   QaDataset,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<TrainReport> {
    let model_cfg = cfg.model_config(vocab.len());
    let (model, first_epoch) = init_model::<B>(cfg, &model_cfg, embeddings, &device)?;
    tracing::info!(
        "Model ready: state_size={}, {} pointer steps, {} parameters",
        model_cfg.state_size,
        model_cfg.pointer_steps(),
        model.num_params()
    );

    let clip = Some(GradientClippingConfig::Norm(cfg.max_gradient_norm));
    match cfg.optimizer {
        OptimizerKind::Adam => {
            let optim = AdamConfig::new()
                .with_epsilon(1e-8)
                .with_grad_clipping(clip)
                .init::<B, QaSystem<B>>();
            fit(cfg, &model_cfg, vocab, model, optim, first_epoch, train_dataset, val_dataset, ckpt_manager, device)
        }
        OptimizerKind::Sgd => {
            let optim = SgdConfig::new()
                .with_gradient_clipping(clip)
                .init::<B, QaSystem<B>>();
            fit(cfg, &model_cfg, vocab, model, optim, first_epoch, train_dataset, val_dataset, ckpt_manager, device)
        }
    }
}

/// Fresh model with pretrained embeddings, or the newest checkpoint
/// from the load dir. Returns the model and the first epoch to run.
fn init_model<B: AutodiffBackend>(
    cfg:        &TrainConfig,
    model_cfg:  &QaSystemConfig,
    embeddings: &EmbeddingMatrix,
    device:     &B::Device,
) -> Result<(QaSystem<B>, usize)> {
    if embeddings.vocab_size != model_cfg.vocab_size || embeddings.dim != model_cfg.embedding_dim {
        anyhow::bail!(
            "Embedding table is {}x{}, model expects {}x{}",
            embeddings.vocab_size,
            embeddings.dim,
            model_cfg.vocab_size,
            model_cfg.embedding_dim
        );
    }

    let model: QaSystem<B> = model_cfg
        .init(device)
        .with_pretrained_embeddings(embeddings.to_tensor(device));

    let load_dir = CheckpointManager::open(cfg.load_train_dir());
    if !load_dir.has_checkpoint() {
        tracing::info!("Created model with fresh parameters");
        return Ok((model, 1));
    }

    tracing::info!("Reading model parameters from '{}'", cfg.load_train_dir());
    let epoch = load_dir.latest_epoch().context("Resuming from checkpoint")?;
    let model = load_dir
        .load_model(model, device)
        .context("Resuming from checkpoint")?;
    Ok((model, epoch + 1))
}

#[allow(clippy::too_many_arguments)]
fn fit<B, O>(
    cfg:           &TrainConfig,
    model_cfg:     &QaSystemConfig,
    vocab:         &Vocabulary,
    mut model:     QaSystem<B>,
    mut optim:     O,
    first_epoch:   usize,
    train_dataset: QaDataset,
    val_dataset:   QaDataset,
    ckpt_manager:  CheckpointManager,
    device:        B::Device,
) -> Result<TrainReport>
where
    B: AutodiffBackend,
    O: Optimizer<QaSystem<B>, B>,
{
    let metrics = MetricsLogger::new(ckpt_manager.dir().clone())?;
    tracing::info!("Epoch metrics → {}", metrics.csv_path().display());
    let val_samples = val_dataset.samples().to_vec();

    let train_count   = train_dataset.sample_count();
    let batches_total = train_count.div_ceil(cfg.batch_size);

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = QaBatcher::<B>::new(device.clone(), model_cfg.pointer_mode, model_cfg.max_answer_length);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend, no autodiff) ──────────────────
    let val_batcher = QaBatcher::<B::InnerBackend>::new(device.clone(), model_cfg.pointer_mode, model_cfg.max_answer_length);
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut report = TrainReport::default();
    let last_epoch = first_epoch + cfg.epochs.saturating_sub(1);

    for epoch in first_epoch..first_epoch + cfg.epochs {
        let lr = cfg.learning_rate_at(epoch);

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let targets = batch
                .targets
                .clone()
                .context("Training batch has no pointer targets")?;
            let (loss, _) = model.forward_loss(&batch, targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);

            if cfg.print_every > 0 && train_batches % cfg.print_every == 0 {
                tracing::info!(
                    "epoch {} batch {}/{} loss={:.4} lr={:.2e}",
                    epoch, train_batches, batches_total, loss_val, lr
                );
            }
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        for batch in val_loader.iter() {
            let Some(targets) = batch.targets.clone() else { continue };
            let (loss, _) = model_valid.forward_loss(&batch, targets);
            val_loss_sum += loss.into_scalar().elem::<f64>();
            val_batches  += 1;
        }
        let avg_val_loss = if val_batches > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };

        // ── F1 / EM on a random evaluation sample ─────────────────────────────
        let eval_samples = sample_subset(&val_samples, cfg.evaluate);
        let scores = score_samples(&model_valid, model_cfg, &eval_samples, vocab, cfg.batch_size, &device)?;

        let row = EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, scores.f1, scores.em);
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | F1={:.2}% | EM={:.2}% ({} samples)",
            epoch, last_epoch, avg_train_loss, avg_val_loss,
            scores.f1 * 100.0, scores.em * 100.0, scores.count,
        );
        if row.is_improvement(report.best_f1) {
            report.best_f1 = row.f1;
            tracing::info!("New best F1 at epoch {}", epoch);
        }

        metrics.log(&row)?;
        ckpt_manager.save_model(&model, epoch, cfg.keep)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);

        report.epochs_run   += 1;
        report.last          = Some(row);
        report.learning_rate = lr;
    }

    tracing::info!("Training complete!");
    Ok(report)
}
