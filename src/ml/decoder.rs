// ============================================================
// Layer 5 — Answer-Pointer Decoder
// ============================================================
// Appends the end-of-answer sentinel (a zero vector) to the
// passage encodings and unrolls the Answer-Pointer cell for a
// fixed number of steps:
//
//   H_r [B, P, 2L] ──cat zero──► H [B, P + 1, 2L]
//   step k: β_k [B, P + 1]
//
// Because the encoder zeroes rows past each passage's length,
// row `length` of H is always a zero vector, so the sentinel
// sits right after the last real token for every example.

use burn::{
    nn::Initializer,
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::answer_pointer_cell::{AnswerPointerCell, AnswerPointerCellConfig};
use crate::ml::lstm_cell::LstmState;

#[derive(Config, Debug)]
pub struct DecoderConfig {
    pub state_size: usize,
    /// Pointer steps to unroll
    pub steps:      usize,
    #[config(default = "Initializer::XavierUniform { gain: 1.0 }")]
    pub initializer: Initializer,
}

impl DecoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Decoder<B> {
        Decoder {
            answer_pointer: AnswerPointerCellConfig::new(self.state_size)
                .with_initializer(self.initializer.clone())
                .init(device),
            steps: self.steps,
        }
    }
}

#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    pub answer_pointer: AnswerPointerCell<B>,
    pub steps:          usize,
}

/// Pointer distributions for every step — [B, steps, P + 1]
#[derive(Debug, Clone)]
pub struct PointerOutput<B: Backend> {
    /// Masked logits (padding carries MASK_VALUE)
    pub logits:        Tensor<B, 3>,
    pub probabilities: Tensor<B, 3>,
}

impl<B: Backend> Decoder<B> {
    pub fn decode(&self, encodings: Tensor<B, 3>, context_lengths: &[usize]) -> PointerOutput<B> {
        let [batch_size, _, width] = encodings.dims();
        let device = encodings.device();

        let sentinel  = Tensor::zeros([batch_size, 1, width], &device);
        let encodings = Tensor::cat(vec![encodings, sentinel], 1);
        let pointer   = self.answer_pointer.bind(encodings, context_lengths);

        let mut state = LstmState::zeros(batch_size, self.answer_pointer.state_size(), &device);
        let mut steps = Vec::with_capacity(self.steps);
        for _ in 0..self.steps {
            let (logits, next) = pointer.step(state);
            steps.push(logits);
            state = next;
        }

        let logits        = Tensor::stack::<3>(steps, 1);
        let probabilities = softmax(logits.clone(), 2);
        PointerOutput { logits, probabilities }
    }
}
