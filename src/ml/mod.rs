// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model code lives here, built bottom-up:
//
//   mask.rs                — length masks for attention softmax
//   lstm_cell.rs           — fused-kernel LSTM cell
//   rnn.rs                 — RecurrentCell trait, dynamic_rnn,
//                            bidirectional_dynamic_rnn
//   match_lstm_cell.rs     — question-attending LSTM over the passage
//   answer_pointer_cell.rs — pointer attention over passage encodings
//   encoder.rs             — LSTMs + bidirectional Match-LSTM
//   decoder.rs             — unrolled Answer Pointer
//   model.rs               — QaSystem: embeddings → encoder → decoder
//   trainer.rs             — training loop, validation, checkpoints
//   predictor.rs           — span decoding, F1/EM scoring
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Wang & Jiang (2016) Machine Comprehension Using
//            Match-LSTM and Answer Pointer

/// Sequence-length masks
pub mod mask;

/// LSTM cell with a single fused gate kernel
pub mod lstm_cell;

/// Recurrent unrolling over padded batches
pub mod rnn;

/// Match-LSTM attention cell
pub mod match_lstm_cell;

/// Answer-Pointer attention cell
pub mod answer_pointer_cell;

/// Question-aware passage encoder
pub mod encoder;

/// Pointer decoder with end-of-answer sentinel
pub mod decoder;

/// Full QaSystem model
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Span decoding, batch prediction and scoring
pub mod predictor;

#[cfg(test)]
pub(crate) mod reference;
