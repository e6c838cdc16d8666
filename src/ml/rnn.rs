// ============================================================
// Layer 5 — Recurrent Unrolling
// ============================================================
// Runs any RecurrentCell over a padded [batch, time, width]
// tensor while respecting each example's true length:
//
//   t <  length → state advances, output is emitted
//   t >= length → state is carried through, output is zero
//
// The backward direction of a bidirectional run reverses each
// example only within its own length, so padding never leaks
// into the first backward step.
//
//   tokens:    a b c _ _        (length 3)
//   reversed:  c b a _ _

use burn::prelude::*;

use crate::ml::lstm_cell::LstmState;
use crate::ml::mask::sequence_mask;

/// One step of a recurrence with LSTM-shaped state.
pub trait RecurrentCell<B: Backend> {
    /// Width of the hidden/cell state.
    fn state_size(&self) -> usize;

    /// input: [batch, width] → (output: [batch, *], next state)
    fn step(&self, input: Tensor<B, 2>, state: LstmState<B>) -> (Tensor<B, 2>, LstmState<B>);
}

/// Unroll `cell` over `inputs` [batch, steps, width].
/// Returns outputs [batch, steps, out] and the state after each
/// example's last valid step. `steps` must be non-zero.
pub fn dynamic_rnn<B: Backend, C: RecurrentCell<B>>(
    cell:    &C,
    inputs:  Tensor<B, 3>,
    lengths: &[usize],
) -> (Tensor<B, 3>, LstmState<B>) {
    let [batch_size, steps, width] = inputs.dims();
    let device = inputs.device();
    let mask   = sequence_mask::<B>(lengths, steps, &device);

    let mut state   = LstmState::zeros(batch_size, cell.state_size(), &device);
    let mut outputs = Vec::with_capacity(steps);

    for t in 0..steps {
        let x_t = inputs
            .clone()
            .slice([0..batch_size, t..t + 1, 0..width])
            .reshape([batch_size, width]);
        let m_t = mask.clone().slice([0..batch_size, t..t + 1]);

        let (output, next) = cell.step(x_t, state.clone());
        state = next.blend(state, m_t.clone());
        outputs.push(output * m_t);
    }

    (Tensor::stack::<3>(outputs, 1), state)
}

/// Apply `weight` [width, out] at every time step of
/// `inputs` [batch, steps, width] → [batch, steps, out].
pub fn project<B: Backend>(inputs: Tensor<B, 3>, weight: Tensor<B, 2>) -> Tensor<B, 3> {
    let [batch_size, steps, width] = inputs.dims();
    let [_, out] = weight.dims();
    inputs
        .reshape([batch_size * steps, width])
        .matmul(weight)
        .reshape([batch_size, steps, out])
}

/// Reverse each example along the time axis within its length.
pub fn reverse_sequences<B: Backend>(inputs: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 3> {
    let [batch_size, steps, width] = inputs.dims();
    let indices: Vec<i32> = lengths
        .iter()
        .flat_map(|&len| {
            let len = len.min(steps);
            (0..steps).map(move |t| if t < len { (len - 1 - t) as i32 } else { t as i32 })
        })
        .collect();

    let indices = Tensor::<B, 1, Int>::from_ints(indices.as_slice(), &inputs.device())
        .reshape([batch_size, steps])
        .unsqueeze_dim::<3>(2)
        .expand([batch_size, steps, width]);
    inputs.gather(1, indices)
}

/// Forward and backward passes over the same inputs. Both outputs
/// are aligned with the input positions.
pub fn bidirectional_dynamic_rnn<B: Backend, F: RecurrentCell<B>, R: RecurrentCell<B>>(
    forward:  &F,
    backward: &R,
    inputs:   Tensor<B, 3>,
    lengths:  &[usize],
) -> (Tensor<B, 3>, Tensor<B, 3>) {
    let (fw_outputs, _) = dynamic_rnn(forward, inputs.clone(), lengths);

    let reversed        = reverse_sequences(inputs, lengths);
    let (bw_outputs, _) = dynamic_rnn(backward, reversed, lengths);
    let bw_outputs      = reverse_sequences(bw_outputs, lengths);

    (fw_outputs, bw_outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::lstm_cell::{LstmCell, LstmCellConfig};
    use crate::ml::reference;
    use burn::backend::NdArray;
    use burn::nn::Initializer;

    type TestBackend = NdArray;

    fn ones_cell(device: &<TestBackend as Backend>::Device) -> LstmCell<TestBackend> {
        LstmCellConfig::new(2, 2)
            .with_initializer(Initializer::Ones)
            .init(device)
    }

    fn sample_inputs() -> Vec<reference::Matrix> {
        vec![
            vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6]],
            vec![vec![-0.2, 0.1], vec![0.0, 0.0], vec![0.0, 0.0]],
        ]
    }

    #[test]
    fn test_reverse_within_length_only() {
        let device = Default::default();
        let x = reference::tensor3::<TestBackend>(&sample_inputs(), &device);
        let r = reverse_sequences(x, &[3, 1]);
        let v: Vec<f32> = r.into_data().to_vec().unwrap();
        assert_eq!(
            v,
            vec![0.5, 0.6, 0.3, 0.4, 0.1, 0.2, -0.2, 0.1, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_outputs_past_length_are_zero() {
        let device = Default::default();
        let cell   = ones_cell(&device);
        let x      = reference::tensor3::<TestBackend>(&sample_inputs(), &device);
        let (outputs, _) = dynamic_rnn(&cell, x, &[3, 1]);

        let second = outputs.slice([1..2, 1..3, 0..2]).reshape([2, 2]);
        reference::assert_close(&second, &[vec![0.0, 0.0], vec![0.0, 0.0]], 1e-7);
    }

    #[test]
    fn test_final_state_stops_at_length() {
        let device = Default::default();
        let cell   = ones_cell(&device);
        let x      = reference::tensor3::<TestBackend>(&sample_inputs(), &device);
        let (_, state) = dynamic_rnn(&cell, x, &[3, 1]);

        // The short example only ever saw its first token.
        let kernel = vec![vec![1.0; 8]; 4];
        let (_, h1) = reference::lstm_step(
            &[vec![-0.2, 0.1]], &[vec![0.0, 0.0]], &[vec![0.0, 0.0]],
            &kernel, &[0.0; 8], 1.0,
        );
        let short = state.hidden.slice([1..2, 0..2]);
        reference::assert_close(&short, &h1, 1e-5);
    }

    #[test]
    fn test_backward_pass_starts_at_last_valid_token() {
        let device = Default::default();
        let fw = ones_cell(&device);
        let bw = ones_cell(&device);
        let x  = reference::tensor3::<TestBackend>(&sample_inputs(), &device);
        let (_, bw_out) = bidirectional_dynamic_rnn(&fw, &bw, x, &[3, 1]);

        // Position 2 of the long example is the first backward step.
        let kernel = vec![vec![1.0; 8]; 4];
        let (_, h) = reference::lstm_step(
            &[vec![0.5, 0.6]], &[vec![0.0, 0.0]], &[vec![0.0, 0.0]],
            &kernel, &[0.0; 8], 1.0,
        );
        let last = bw_out.slice([0..1, 2..3, 0..2]).reshape([1, 2]);
        reference::assert_close(&last, &h, 1e-5);
    }
}
