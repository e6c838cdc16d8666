// ============================================================
// Layer 5 — Sequence Masks
// ============================================================
// Every batch is padded to a fixed length, so each recurrence
// needs to know which positions are real tokens.
//
//   sequence_mask  → 1.0 / 0.0 multiplier used to freeze state
//   softmax_mask   → 0.0 / MASK_VALUE offset added to logits
//
// MASK_VALUE is finite: a fully padded row softmaxes to a
// uniform distribution, never NaN.

use burn::prelude::*;

/// Offset added to the logits of padded positions.
/// exp(MASK_VALUE - max) underflows to exactly 0 in f32.
pub const MASK_VALUE: f32 = -1e30;

/// Host-side 0/1 mask, row-major [lengths.len(), max_len].
pub fn mask_values(lengths: &[usize], max_len: usize) -> Vec<f32> {
    lengths
        .iter()
        .flat_map(|&len| (0..max_len).map(move |t| if t < len { 1.0 } else { 0.0 }))
        .collect()
}

/// 1.0 where `t < length`, 0.0 elsewhere — shape [batch, max_len]
pub fn sequence_mask<B: Backend>(
    lengths: &[usize],
    max_len: usize,
    device:  &B::Device,
) -> Tensor<B, 2> {
    let values = mask_values(lengths, max_len);
    Tensor::<B, 1>::from_floats(values.as_slice(), device)
        .reshape([lengths.len(), max_len])
}

/// 0.0 where `t < length`, MASK_VALUE elsewhere — shape [batch, max_len]
pub fn softmax_mask<B: Backend>(
    lengths: &[usize],
    max_len: usize,
    device:  &B::Device,
) -> Tensor<B, 2> {
    let values: Vec<f32> = mask_values(lengths, max_len)
        .into_iter()
        .map(|m| if m > 0.0 { 0.0 } else { MASK_VALUE })
        .collect();
    Tensor::<B, 1>::from_floats(values.as_slice(), device)
        .reshape([lengths.len(), max_len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::activation::softmax;

    type TestBackend = NdArray;

    #[test]
    fn test_mask_values_layout() {
        let m = mask_values(&[2, 0, 3], 3);
        assert_eq!(m, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_lengths_beyond_max_are_clamped() {
        let m = mask_values(&[5], 2);
        assert_eq!(m, vec![1.0, 1.0]);
    }

    #[test]
    fn test_masked_positions_get_zero_probability() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats([[0.3, 0.9, 2.0]], &device);
        let mask   = softmax_mask::<TestBackend>(&[2], 3, &device);
        let probs: Vec<f32> = softmax(logits + mask, 1)
            .into_data()
            .to_vec::<f32>()
            .unwrap();

        assert_eq!(probs[2], 0.0);
        let expected_first = (0.3f32).exp() / ((0.3f32).exp() + (0.9f32).exp());
        assert!((probs[0] - expected_first).abs() < 1e-6);
    }

    #[test]
    fn test_fully_masked_row_is_not_nan() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::zeros([1, 4], &device);
        let mask   = softmax_mask::<TestBackend>(&[0], 4, &device);
        let probs: Vec<f32> = softmax(logits + mask, 1)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert!(probs.iter().all(|p| (p - 0.25).abs() < 1e-6));
    }
}
