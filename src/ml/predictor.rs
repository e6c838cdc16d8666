// ============================================================
// Layer 5 — Predictor
// ============================================================
// Turns pointer distributions into answer spans.
//
//   Boundary  → argmax over s <= e < len, e - s < max_answer_length
//               of p_start(s) · p_end(e)
//   Sequence  → follow each step's argmax until the sentinel;
//               the span covers the pointed tokens
//
// Also scores predictions against gold spans with SQuAD F1/EM,
// rendering both sides through the vocabulary first. Used by the
// trainer (per-epoch evaluation sample) and by `evaluate`/`ask`.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::batcher::QaBatcher;
use crate::data::dataset::QaSample;
use crate::domain::scoring::ScoreSummary;
use crate::domain::span::{best_boundary_span, span_from_sequence, AnswerSpan, PointerMode};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::vocab::Vocabulary;
use crate::ml::decoder::PointerOutput;
use crate::ml::model::{QaSystem, QaSystemConfig};

pub type InferBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub span:       AnswerSpan,
    pub confidence: f32,
}

/// One span per example from a decoder output.
pub fn decode_spans<B: Backend>(
    output:            &PointerOutput<B>,
    context_lengths:   &[usize],
    mode:              PointerMode,
    max_answer_length: usize,
) -> Result<Vec<Prediction>> {
    let [batch_size, steps, positions] = output.probabilities.dims();
    let probs: Vec<f32> = output
        .probabilities
        .clone()
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| anyhow!("Cannot read pointer probabilities: {e:?}"))?;

    let step_row = |b: usize, s: usize| row(&probs, (b * steps + s) * positions, positions);

    let predictions = (0..batch_size)
        .map(|b| {
            let length = context_lengths[b];
            let (span, confidence) = match mode {
                PointerMode::Boundary => best_boundary_span(
                    step_row(b, 0),
                    step_row(b, steps.min(2) - 1),
                    length,
                    max_answer_length,
                ),
                PointerMode::Sequence => {
                    let rows: Vec<Vec<f32>> = (0..steps).map(|s| step_row(b, s).to_vec()).collect();
                    span_from_sequence(&rows, length)
                }
            };
            Prediction { span, confidence }
        })
        .collect();
    Ok(predictions)
}

fn row(values: &[f32], at: usize, width: usize) -> &[f32] {
    &values[at..at + width]
}

/// Run the model over `samples` in chunks of `batch_size`.
pub fn predict_samples<B: Backend>(
    model:      &QaSystem<B>,
    config:     &QaSystemConfig,
    samples:    &[QaSample],
    batch_size: usize,
    device:     &B::Device,
) -> Result<Vec<Prediction>> {
    let batcher = QaBatcher::<B>::new(device.clone(), config.pointer_mode, config.max_answer_length);
    let mut predictions = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(batch_size.max(1)) {
        let batch  = batcher.batch(chunk.to_vec());
        let output = model.forward(&batch);
        predictions.extend(decode_spans(
            &output,
            &batch.context_lengths,
            config.pointer_mode,
            config.max_answer_length,
        )?);
    }
    Ok(predictions)
}

/// Predicted answer text, rendered through the vocabulary.
pub fn render_prediction(sample: &QaSample, prediction: &Prediction, vocab: &Vocabulary) -> String {
    let context = &sample.context_ids[..sample.context_length];
    vocab.render(prediction.span.slice(context))
}

/// Mean F1/EM of the model on the labelled samples in `samples`.
/// Answers cut off by the context limit are scored against their
/// full gold text, which the model cannot reach.
pub fn score_samples<B: Backend>(
    model:      &QaSystem<B>,
    config:     &QaSystemConfig,
    samples:    &[QaSample],
    vocab:      &Vocabulary,
    batch_size: usize,
    device:     &B::Device,
) -> Result<ScoreSummary> {
    let labelled: Vec<QaSample> = samples.iter().filter(|s| s.is_labelled()).cloned().collect();
    if labelled.len() < samples.len() {
        tracing::debug!("Scoring skips {} unlabelled samples", samples.len() - labelled.len());
    }
    let truncated = labelled.iter().filter(|s| !s.is_answerable()).count();
    if truncated > 0 {
        tracing::info!(
            "{} of {} scored answers lie past {} context tokens",
            truncated,
            labelled.len(),
            config.max_context_length
        );
    }

    let predictions = predict_samples(model, config, &labelled, batch_size, device)?;
    let pairs: Vec<(String, String)> = labelled
        .iter()
        .zip(&predictions)
        .filter_map(|(sample, prediction)| {
            let truth = vocab.render(sample.answer_ids()?);
            Some((render_prediction(sample, prediction, vocab), truth))
        })
        .collect();

    Ok(ScoreSummary::from_pairs(pairs.iter().map(|(p, t)| (p.as_str(), t.as_str()))))
}

// ─── Predictor ────────────────────────────────────────────────────────────────
/// A trained model restored from a checkpoint directory.
pub struct Predictor<B: Backend> {
    pub model:  QaSystem<B>,
    pub config: QaSystemConfig,
    pub device: B::Device,
}

impl<B: Backend> Predictor<B> {
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let (model, config) = ckpt.restore::<B>(&device)?;
        tracing::info!(
            "Model loaded: state_size={}, pointer_mode={:?}",
            config.state_size,
            config.pointer_mode
        );
        Ok(Self { model, config, device })
    }

    pub fn predict(&self, samples: &[QaSample], batch_size: usize) -> Result<Vec<Prediction>> {
        predict_samples(&self.model, &self.config, samples, batch_size, &self.device)
    }

    pub fn score(&self, samples: &[QaSample], vocab: &Vocabulary, batch_size: usize) -> Result<ScoreSummary> {
        score_samples(&self.model, &self.config, samples, vocab, batch_size, &self.device)
    }
}
