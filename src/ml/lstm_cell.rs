// ============================================================
// Layer 5 — LSTM Cell
// ============================================================
// A single LSTM step with a fused kernel:
//
//   [i, j, f, o] = [x, h_{t-1}] · K + b
//   c_t = σ(f + forget_bias) ⊙ c_{t-1} + σ(i) ⊙ tanh(j)
//   h_t = σ(o) ⊙ tanh(c_t)
//
// Burn ships a sequence-level Lstm module, but the Match-LSTM
// and Answer-Pointer cells need to run one step at a time with
// an attention read in between, so the cell is exposed here.
//
// Initialisation: the kernel is Xavier-uniform over the fused
// [d_input + d_hidden, 4·d_hidden] matrix, not orthogonal. Burn's
// Initializer has no orthogonal variant, so recurrent weights start
// with a different spectrum than an orthogonally initialised cell.
//
// Reference: Hochreiter & Schmidhuber (1997)

use burn::{
    module::Param,
    nn::Initializer,
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::ml::rnn::RecurrentCell;

#[derive(Config, Debug)]
pub struct LstmCellConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
    /// Added to the forget gate so early training keeps memory.
    #[config(default = 1.0)]
    pub forget_bias: f64,
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

impl LstmCellConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmCell<B> {
        let fan_in  = self.d_input + self.d_hidden;
        let fan_out = 4 * self.d_hidden;
        let kernel  = self.initializer.init_with(
            [fan_in, fan_out], Some(fan_in), Some(fan_out), device,
        );
        let bias = Initializer::Zeros.init([fan_out], device);
        LstmCell {
            kernel,
            bias,
            d_input:     self.d_input,
            d_hidden:    self.d_hidden,
            forget_bias: self.forget_bias,
        }
    }
}

#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    /// [d_input + d_hidden, 4 * d_hidden], gate order i, j, f, o
    pub kernel:      Param<Tensor<B, 2>>,
    pub bias:        Param<Tensor<B, 1>>,
    pub d_input:     usize,
    pub d_hidden:    usize,
    pub forget_bias: f64,
}

/// Recurrent state carried between steps.
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub cell:   Tensor<B, 2>,
    pub hidden: Tensor<B, 2>,
}

impl<B: Backend> LstmState<B> {
    pub fn zeros(batch_size: usize, size: usize, device: &B::Device) -> Self {
        Self {
            cell:   Tensor::zeros([batch_size, size], device),
            hidden: Tensor::zeros([batch_size, size], device),
        }
    }

    /// Per-row select: `mask` is [batch, 1] with 1.0 = take `self`.
    pub fn blend(self, previous: Self, mask: Tensor<B, 2>) -> Self {
        let keep = mask.clone().neg().add_scalar(1.0);
        Self {
            cell:   self.cell * mask.clone() + previous.cell * keep.clone(),
            hidden: self.hidden * mask + previous.hidden * keep,
        }
    }
}

impl<B: Backend> LstmCell<B> {
    /// x: [batch, d_input] → new state (hidden is the output)
    pub fn forward(&self, x: Tensor<B, 2>, state: LstmState<B>) -> LstmState<B> {
        let [batch_size, _] = x.dims();
        let h = self.d_hidden;

        let gates = Tensor::cat(vec![x, state.hidden], 1).matmul(self.kernel.val())
            + self.bias.val().unsqueeze::<2>();
        let gate = |k: usize| gates.clone().slice([0..batch_size, k * h..(k + 1) * h]);

        let i = sigmoid(gate(0));
        let j = gate(1).tanh();
        let f = sigmoid(gate(2).add_scalar(self.forget_bias));
        let o = sigmoid(gate(3));

        let cell   = f * state.cell + i * j;
        let hidden = o * cell.clone().tanh();
        LstmState { cell, hidden }
    }
}

impl<B: Backend> RecurrentCell<B> for LstmCell<B> {
    fn state_size(&self) -> usize {
        self.d_hidden
    }

    fn step(&self, input: Tensor<B, 2>, state: LstmState<B>) -> (Tensor<B, 2>, LstmState<B>) {
        let next = self.forward(input, state);
        (next.hidden.clone(), next)
    }
}
