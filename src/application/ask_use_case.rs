// ============================================================
// Layer 2 — Ask Use Case
// ============================================================
// Answers a free-text question about a free-text passage:
//
//   Step 1: tokenise question + context with the saved tokenizer
//   Step 2: pad to the trained maximum lengths
//   Step 3: predict the span, render its tokens back to text
//
// Contexts longer than max_context_length are truncated, so the
// answer can only come from the first max_context_length tokens.

use anyhow::{bail, Result};
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::dataset::QaSample;
use crate::domain::qa_pair::QaPair;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{encode_ids, TokenizerStore},
    vocab::Vocabulary,
};
use crate::ml::predictor::{render_prediction, Prediction, Predictor};

pub struct AskUseCase<B: Backend> {
    tokenizer: Tokenizer,
    vocab:     Vocabulary,
    predictor: Predictor<B>,
}

/// An answer with the model's confidence in it.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text:       String,
    pub confidence: f32,
}

impl<B: Backend> AskUseCase<B> {
    pub fn new(train_dir: &str, vocab_path: &str, device: B::Device) -> Result<Self> {
        let ckpt = CheckpointManager::open(train_dir);
        if !ckpt.has_checkpoint() {
            bail!("No checkpoint in '{train_dir}'. Run 'train' first.");
        }
        let vocab     = Vocabulary::load(vocab_path)?;
        let tokenizer = TokenizerStore::new(train_dir).load_or_build(&vocab)?;
        let predictor = Predictor::from_checkpoint(&ckpt, device)?;
        Ok(Self { tokenizer, vocab, predictor })
    }

    pub fn ask(&self, question: &str, context: &str) -> Result<Answer> {
        // ── Step 1: Tokenise ──────────────────────────────────────────────────
        let question_ids = encode_ids(&self.tokenizer, question)?;
        let context_ids  = encode_ids(&self.tokenizer, context)?;
        if question_ids.is_empty() || context_ids.is_empty() {
            bail!("Question and context must both contain at least one token");
        }

        // ── Step 2: Pad ───────────────────────────────────────────────────────
        let cfg    = &self.predictor.config;
        let sample = QaSample::from_pair(
            &QaPair::new(question_ids, context_ids, None),
            cfg.max_question_length,
            cfg.max_context_length,
        );
        tracing::debug!(
            "Question: {} tokens, context: {} tokens",
            sample.question_length,
            sample.context_length
        );

        // ── Step 3: Predict ───────────────────────────────────────────────────
        let predictions = self.predictor.predict(std::slice::from_ref(&sample), 1)?;
        let Some(prediction) = predictions.first() else {
            bail!("Model returned no prediction");
        };
        tracing::debug!(
            "Span {}..={} ({} tokens), confidence {:.3}",
            prediction.span.start,
            prediction.span.end,
            prediction.span.len(),
            prediction.confidence
        );
        Ok(to_answer(&sample, prediction, &self.vocab))
    }
}

fn to_answer(sample: &QaSample, prediction: &Prediction, vocab: &Vocabulary) -> Answer {
    Answer {
        text:       render_prediction(sample, prediction, vocab),
        confidence: prediction.confidence,
    }
}
