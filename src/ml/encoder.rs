// ============================================================
// Layer 5 — Match-LSTM Encoder
// ============================================================
// Turns embedded question/context pairs into question-aware
// passage encodings:
//
//   question emb ──LSTM──► H_q [B, Q, L] ──────────────┐
//                                                      ▼
//   context emb  ──LSTM──► H_p [B, P, L] ──► Bi-Match-LSTM ──► H_r [B, P, 2L]
//
// The forward and backward Match-LSTM passes share the same
// question encodings but have separate weights. Their outputs
// are concatenated along the feature axis.

use burn::{nn::Initializer, prelude::*};

use crate::ml::lstm_cell::{LstmCell, LstmCellConfig};
use crate::ml::match_lstm_cell::{MatchLstmCell, MatchLstmCellConfig};
use crate::ml::rnn::{bidirectional_dynamic_rnn, dynamic_rnn};

#[derive(Config, Debug)]
pub struct EncoderConfig {
    pub embedding_dim: usize,
    pub state_size:    usize,
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        let lstm = LstmCellConfig::new(self.embedding_dim, self.state_size)
            .with_initializer(self.initializer.clone());
        let matcher = MatchLstmCellConfig::new(self.state_size)
            .with_initializer(self.initializer.clone());
        Encoder {
            question_lstm: lstm.init(device),
            context_lstm:  lstm.init(device),
            match_fw:      matcher.init(device),
            match_bw:      matcher.init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    pub question_lstm: LstmCell<B>,
    pub context_lstm:  LstmCell<B>,
    pub match_fw:      MatchLstmCell<B>,
    pub match_bw:      MatchLstmCell<B>,
}

impl<B: Backend> Encoder<B> {
    /// question: [B, Q, E], context: [B, P, E] → [B, P, 2L]
    /// Rows past a context's length are zero.
    pub fn encode(
        &self,
        question:         Tensor<B, 3>,
        question_lengths: &[usize],
        context:          Tensor<B, 3>,
        context_lengths:  &[usize],
    ) -> Tensor<B, 3> {
        let (h_q, _) = dynamic_rnn(&self.question_lstm, question, question_lengths);
        let (h_p, _) = dynamic_rnn(&self.context_lstm, context, context_lengths);

        let forward  = self.match_fw.bind(h_q.clone(), question_lengths);
        let backward = self.match_bw.bind(h_q, question_lengths);
        let (h_fw, h_bw) = bidirectional_dynamic_rnn(&forward, &backward, h_p, context_lengths);

        Tensor::cat(vec![h_fw, h_bw], 2)
    }
}
