// ============================================================
// Layer 4 — Q&A Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<QaSample> into
// device tensors plus the host-side lengths the recurrent layers
// need for masking.
//
// How batching works here:
//   Input:  N QaSamples, questions padded to Q, contexts to P
//   Output: question_ids [N, Q], context_ids [N, P]
//           targets      [N, steps]  (only if every sample is labelled)
//
//   Ids are flattened row by row and reshaped:
//   [s1_t1, ..., s1_tP, s2_t1, ..., sN_tP] → [N, P]
//
// Pointer targets depend on the decoding mode, so the batcher
// carries the mode and step count (see domain::span):
//   Boundary  span 2..=4           → [2, 4]
//   Sequence  span 2..=4, P_len 6  → [2, 3, 4, 6, 6, ...]
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::QaSample;
use crate::domain::span::{pointer_targets, PointerMode};

// ─── QaBatch ──────────────────────────────────────────────────────────────────
/// A batch of Q&A samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct QaBatch<B: Backend> {
    /// Question token ids — shape: [batch_size, max_question_length]
    pub question_ids: Tensor<B, 2, Int>,

    /// Real question lengths, one per row
    pub question_lengths: Vec<usize>,

    /// Context token ids — shape: [batch_size, max_context_length]
    pub context_ids: Tensor<B, 2, Int>,

    /// Real context lengths, one per row
    pub context_lengths: Vec<usize>,

    /// Pointer targets — shape: [batch_size, steps]
    /// None unless every sample has an in-range span
    pub targets: Option<Tensor<B, 2, Int>>,
}

// ─── QaBatcher ────────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct QaBatcher<B: Backend> {
    pub device: B::Device,
    pub mode:   PointerMode,
    pub steps:  usize,
}

impl<B: Backend> QaBatcher<B> {
    pub fn new(device: B::Device, mode: PointerMode, max_answer_length: usize) -> Self {
        Self { device, mode, steps: mode.steps(max_answer_length) }
    }

    fn id_tensor(&self, rows: Vec<&[u32]>) -> Tensor<B, 2, Int> {
        let batch_size = rows.len();
        let width      = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        // Rows are pre-padded; anything shorter is padded with 0 here
        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|r| (0..width).map(move |i| r.get(i).copied().unwrap_or(0) as i32))
            .collect();
        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([batch_size, width])
    }

    fn targets(&self, items: &[QaSample]) -> Option<Tensor<B, 2, Int>> {
        let mut flat = Vec::with_capacity(items.len() * self.steps);
        for item in items {
            let span = item.span.filter(|_| item.is_answerable())?;
            flat.extend(
                pointer_targets(span, item.context_length, self.mode, self.steps)
                    .into_iter()
                    .map(|t| t as i32),
            );
        }
        Some(
            Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
                .reshape([items.len(), self.steps]),
        )
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<QaSample, QaBatch<B>> for QaBatcher<B> {
    fn batch(&self, items: Vec<QaSample>) -> QaBatch<B> {
        let question_ids = self.id_tensor(items.iter().map(|s| s.question_ids.as_slice()).collect());
        let context_ids  = self.id_tensor(items.iter().map(|s| s.context_ids.as_slice()).collect());
        let targets      = self.targets(&items);

        QaBatch {
            question_ids,
            question_lengths: items.iter().map(|s| s.question_length).collect(),
            context_ids,
            context_lengths:  items.iter().map(|s| s.context_length).collect(),
            targets,
        }
    }
}
