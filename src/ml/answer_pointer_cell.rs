// ============================================================
// Layer 5 — Answer-Pointer Cell
// ============================================================
// Points into the encoded passage. Each step produces a
// distribution over passage positions and feeds the
// attention-weighted passage back into an LSTM:
//
//   F_k = tanh(V·H + (W·h_{k-1} + b))
//   β_k = softmax(v·F_k + c)             over passage positions
//   h_k = LSTM(H·β_k, h_{k-1})
//
// Shapes (B = batch, P = passage length, L = state size):
//   H    [B, P + 1, 2L]   (last row is the end-of-answer sentinel)
//   β_k  [B, P + 1]
//
// Unlike the Match-LSTM cell there is no per-step input: the
// recurrence is driven purely by its own state.
//
// Reference: Vinyals et al. (2015) Pointer Networks
//            Wang & Jiang (2016) Match-LSTM and Answer Pointer

use burn::{
    module::Param,
    nn::Initializer,
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::lstm_cell::{LstmCell, LstmCellConfig, LstmState};
use crate::ml::mask::softmax_mask;
use crate::ml::rnn::project;

#[derive(Config, Debug)]
pub struct AnswerPointerCellConfig {
    pub state_size: usize,
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

impl AnswerPointerCellConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AnswerPointerCell<B> {
        let n    = self.state_size;
        let init = &self.initializer;
        AnswerPointerCell {
            v_enc:  init.init_with([2 * n, n], Some(2 * n), Some(n), device),
            w_h:    init.init_with([n, n], Some(n), Some(n), device),
            b:      Initializer::Zeros.init([1, n], device),
            v:      init.init_with([n, 1], Some(n), Some(1), device),
            c:      Initializer::Zeros.init([1], device),
            lstm:   LstmCellConfig::new(2 * n, n)
                .with_initializer(init.clone())
                .init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct AnswerPointerCell<B: Backend> {
    /// V — [2L, L]
    pub v_enc: Param<Tensor<B, 2>>,
    /// W — [L, L]
    pub w_h:   Param<Tensor<B, 2>>,
    pub b:     Param<Tensor<B, 2>>,
    pub v:     Param<Tensor<B, 2>>,
    pub c:     Param<Tensor<B, 1>>,
    pub lstm:  LstmCell<B>,
}

impl<B: Backend> AnswerPointerCell<B> {
    pub fn state_size(&self) -> usize {
        self.lstm.d_hidden
    }

    /// Attach the cell to one batch of passage encodings.
    /// `lengths` are passage lengths; position `length` (the
    /// sentinel) is a valid pointer target.
    pub fn bind(&self, encodings: Tensor<B, 3>, lengths: &[usize]) -> PointerAttention<'_, B> {
        let [_, positions, _] = encodings.dims();
        let with_sentinel: Vec<usize> = lengths.iter().map(|&l| l + 1).collect();
        let projected = project(encodings.clone(), self.v_enc.val());
        let mask      = softmax_mask(&with_sentinel, positions, &encodings.device());
        PointerAttention { cell: self, encodings, projected, mask }
    }
}

/// An Answer-Pointer cell bound to a batch of passage encodings.
pub struct PointerAttention<'a, B: Backend> {
    cell:      &'a AnswerPointerCell<B>,
    encodings: Tensor<B, 3>,
    /// V·H — [B, P + 1, L]
    projected: Tensor<B, 3>,
    mask:      Tensor<B, 2>,
}

impl<B: Backend> PointerAttention<'_, B> {
    /// Masked pointer logits [B, P + 1] and the read H·β_k [B, 2L].
    pub fn attend(&self, h_prev: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [batch_size, positions, width] = self.encodings.dims();
        let cell = self.cell;

        let query = h_prev.matmul(cell.w_h.val()) + cell.b.val();
        let f = (self.projected.clone() + query.unsqueeze_dim::<3>(1)).tanh();

        let logits = project(f, cell.v.val())
            .reshape([batch_size, positions])
            + cell.c.val().unsqueeze::<2>()
            + self.mask.clone();
        let beta = softmax(logits.clone(), 1);

        let read = (self.encodings.clone() * beta.unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch_size, width]);

        (logits, read)
    }

    /// One pointer step: logits for this step and the next state.
    pub fn step(&self, state: LstmState<B>) -> (Tensor<B, 2>, LstmState<B>) {
        let (logits, read) = self.attend(state.hidden.clone());
        let next = self.cell.lstm.forward(read, state);
        (logits, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::reference::{self, Matrix};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn encodings() -> Vec<Matrix> {
        vec![
            vec![vec![0.4, 0.5, 0.6, 0.2, 0.5, 0.1], vec![0.0; 6]],
            vec![vec![0.3, -0.2, -0.1, 0.7, -0.3, -0.7], vec![0.0; 6]],
        ]
    }

    fn patterned_cell(device: &<TestBackend as Backend>::Device) -> (AnswerPointerCell<TestBackend>, Matrix, Matrix) {
        let mut cell: AnswerPointerCell<TestBackend> = AnswerPointerCellConfig::new(3)
            .with_initializer(Initializer::Ones)
            .init(device);
        let v_enc = reference::patterned(6, 3, 0.2);
        let w_h   = reference::patterned(3, 3, 0.1);
        cell.v_enc = Param::from_tensor(reference::tensor2(&v_enc, device));
        cell.w_h   = Param::from_tensor(reference::tensor2(&w_h, device));
        cell.b     = Param::from_tensor(Tensor::full([1, 3], 0.1, device));
        cell.v     = Param::from_tensor(reference::tensor2(&[vec![0.5], vec![-1.0], vec![0.3]], device));
        (cell, v_enc, w_h)
    }

    fn expected(h: &Matrix, lengths: &[usize], v_enc: &Matrix, w_h: &Matrix) -> (Matrix, Matrix) {
        let mut betas = Vec::new();
        let mut reads = Vec::new();
        for (i, enc) in encodings().iter().enumerate() {
            let query: Vec<f64> = reference::matmul(&[h[i].clone()], w_h)[0]
                .iter()
                .map(|q| q + 0.1)
                .collect();
            let (beta, read) = reference::attention(
                enc, v_enc, &query, &[0.5, -1.0, 0.3], 0.0, lengths[i] + 1,
            );
            betas.push(beta);
            reads.push(read);
        }
        (betas, reads)
    }

    #[test]
    fn test_pointer_distribution_matches_reference() {
        let device = Default::default();
        let (cell, v_enc, w_h) = patterned_cell(&device);
        let h: Matrix = vec![vec![0.2, -0.1, 0.4], vec![0.0, 0.3, -0.3]];

        let bound = cell.bind(reference::tensor3(&encodings(), &device), &[1, 1]);
        let (logits, read) = bound.attend(reference::tensor2(&h, &device));
        let beta = softmax(logits, 1);

        let (want_beta, want_read) = expected(&h, &[1, 1], &v_enc, &w_h);
        reference::assert_close(&beta, &want_beta, 1e-5);
        reference::assert_close(&read, &want_read, 1e-5);
    }

    #[test]
    fn test_positions_past_sentinel_are_masked() {
        let device = Default::default();
        let (cell, v_enc, w_h) = patterned_cell(&device);
        let h: Matrix = vec![vec![0.0; 3], vec![0.0; 3]];

        // First passage is empty: only the sentinel (index 0) is valid.
        let bound = cell.bind(reference::tensor3(&encodings(), &device), &[0, 1]);
        let (logits, _) = bound.attend(reference::tensor2(&h, &device));
        let beta = softmax(logits, 1);

        let (want_beta, _) = expected(&h, &[0, 1], &v_enc, &w_h);
        assert_eq!(want_beta[0], vec![1.0, 0.0]);
        reference::assert_close(&beta, &want_beta, 1e-6);
    }

    #[test]
    fn test_step_advances_lstm_with_attention_read() {
        let device = Default::default();
        let (cell, v_enc, w_h) = patterned_cell(&device);
        let h: Matrix = vec![vec![0.2, -0.1, 0.4], vec![0.0, 0.3, -0.3]];
        let c: Matrix = vec![vec![0.0; 3], vec![0.0; 3]];

        let bound = cell.bind(reference::tensor3(&encodings(), &device), &[1, 1]);
        let state = LstmState {
            cell:   reference::tensor2(&c, &device),
            hidden: reference::tensor2(&h, &device),
        };
        let (_, next) = bound.step(state);

        let (_, reads) = expected(&h, &[1, 1], &v_enc, &w_h);
        let kernel = vec![vec![1.0; 12]; 9];
        let (_, want_h) = reference::lstm_step(&reads, &h, &c, &kernel, &[0.0; 12], 1.0);
        reference::assert_close(&next.hidden, &want_h, 1e-5);
    }
}
