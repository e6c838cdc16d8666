// ============================================================
// Layer 5 — Match-LSTM Cell
// ============================================================
// Reads the passage one token at a time and, at every step,
// attends over the whole question:
//
//   G_t = tanh(W_q·H_q + (W_p·h_p_t + W_r·h_{t-1} + b_p))
//   a_t = softmax(w_a·G_t + b_a)          over question positions
//   z_t = concat(h_p_t, H_q·a_t)
//   h_t = LSTM(z_t, h_{t-1})
//
// Shapes (B = batch, Q = question length, L = state size):
//   H_q  [B, Q, L]     h_p_t, h_{t-1}  [B, L]
//   a_t  [B, Q]        z_t             [B, 2L]
//
// W_q·H_q does not depend on t, so it is computed once when the
// cell is bound to a batch of questions.
//
// Reference: Wang & Jiang (2016) Machine Comprehension Using
//            Match-LSTM and Answer Pointer

use burn::{
    module::Param,
    nn::Initializer,
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::lstm_cell::{LstmCell, LstmCellConfig, LstmState};
use crate::ml::mask::softmax_mask;
use crate::ml::rnn::{project, RecurrentCell};

#[derive(Config, Debug)]
pub struct MatchLstmCellConfig {
    pub state_size: usize,
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

impl MatchLstmCellConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MatchLstmCell<B> {
        let n      = self.state_size;
        let square = || -> Param<Tensor<B, 2>> {
            self.initializer.init_with([n, n], Some(n), Some(n), device)
        };
        MatchLstmCell {
            w_q:  square(),
            w_p:  square(),
            w_r:  square(),
            b_p:  Initializer::Zeros.init([1, n], device),
            w_a:  self.initializer.init_with([n, 1], Some(n), Some(1), device),
            b_a:  Initializer::Zeros.init([1], device),
            lstm: LstmCellConfig::new(2 * n, n)
                .with_initializer(self.initializer.clone())
                .init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct MatchLstmCell<B: Backend> {
    pub w_q:  Param<Tensor<B, 2>>,
    pub w_p:  Param<Tensor<B, 2>>,
    pub w_r:  Param<Tensor<B, 2>>,
    pub b_p:  Param<Tensor<B, 2>>,
    pub w_a:  Param<Tensor<B, 2>>,
    pub b_a:  Param<Tensor<B, 1>>,
    pub lstm: LstmCell<B>,
}

impl<B: Backend> MatchLstmCell<B> {
    pub fn state_size(&self) -> usize {
        self.lstm.d_hidden
    }

    /// Attach the cell to one batch of encoded questions.
    pub fn bind(&self, question: Tensor<B, 3>, question_lengths: &[usize]) -> MatchAttention<'_, B> {
        let [_, q_len, _] = question.dims();
        let projected = project(question.clone(), self.w_q.val());
        let mask      = softmax_mask(question_lengths, q_len, &question.device());
        MatchAttention { cell: self, question, projected, mask }
    }
}

/// A Match-LSTM cell bound to a batch of question encodings.
pub struct MatchAttention<'a, B: Backend> {
    cell:      &'a MatchLstmCell<B>,
    question:  Tensor<B, 3>,
    /// W_q·H_q — [B, Q, L]
    projected: Tensor<B, 3>,
    mask:      Tensor<B, 2>,
}

impl<B: Backend> MatchAttention<'_, B> {
    /// Attention weights a_t [B, Q] and the LSTM input z_t [B, 2L].
    pub fn attend(&self, h_p: Tensor<B, 2>, h_prev: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch_size, q_len, n] = self.question.dims();
        let cell = self.cell;

        let query = h_p.clone().matmul(cell.w_p.val())
            + h_prev.matmul(cell.w_r.val())
            + cell.b_p.val();
        let g = (self.projected.clone() + query.unsqueeze_dim::<3>(1)).tanh();

        let scores = project(g, cell.w_a.val())
            .reshape([batch_size, q_len])
            + cell.b_a.val().unsqueeze::<2>()
            + self.mask.clone();
        let alpha = softmax(scores, 1);

        let read = (self.question.clone() * alpha.clone().unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch_size, n]);

        (alpha, Tensor::cat(vec![h_p, read], 1))
    }
}

impl<B: Backend> RecurrentCell<B> for MatchAttention<'_, B> {
    fn state_size(&self) -> usize {
        self.cell.state_size()
    }

    fn step(&self, input: Tensor<B, 2>, state: LstmState<B>) -> (Tensor<B, 2>, LstmState<B>) {
        let (_, z) = self.attend(input, state.hidden.clone());
        let next   = self.cell.lstm.forward(z, state);
        (next.hidden.clone(), next)
    }
}
