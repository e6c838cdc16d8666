// ============================================================
// Layer 4 — Sequence Padding
// ============================================================
// The model works on fixed-width batches, so every question and
// context is cut or padded to its configured maximum length:
//
//   ids = [4, 9, 2], max_len = 5  →  [4, 9, 2, 0, 0], length 3
//   ids = [4, 9, 2], max_len = 2  →  [4, 9],          length 2
//
// Id 0 is the padding token; the true length travels alongside
// so the recurrent layers and attention masks can ignore it.

pub const PAD_ID: u32 = 0;

/// Truncate or pad `ids` to exactly `max_len` tokens.
/// Returns the padded ids and the number of real tokens kept.
pub fn pad_sequence(ids: &[u32], max_len: usize) -> (Vec<u32>, usize) {
    let length = ids.len().min(max_len);
    let mut padded = Vec::with_capacity(max_len);
    padded.extend_from_slice(&ids[..length]);
    padded.resize(max_len, PAD_ID);
    (padded, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pads_short_sequences() {
        assert_eq!(pad_sequence(&[4, 9, 2], 5), (vec![4, 9, 2, 0, 0], 3));
    }

    #[test]
    fn test_truncates_long_sequences() {
        assert_eq!(pad_sequence(&[4, 9, 2], 2), (vec![4, 9], 2));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(pad_sequence(&[], 3), (vec![0, 0, 0], 0));
    }
}
