// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Used when the data directory has no "val" split: the training
// examples are shuffled and a held-out fraction becomes the
// validation set that drives per-epoch loss and F1/EM reporting.
//
// SQuAD id files are grouped by article, so the examples are
// shuffled first; otherwise the validation set would cover only
// the last few articles.
//
// Also used to draw the random evaluation sample each epoch
// (see ml::trainer).
//
// Reference: rand crate documentation (SliceRandom)

use rand::seq::SliceRandom;

/// Shuffle `samples` and split into (train, validation), with
/// `train_fraction` of them (rounded) going to training.
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64) -> (Vec<T>, Vec<T>) {
    let mut rng = rand::thread_rng();
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let split_at = (((total as f64) * train_fraction).round() as usize).min(total);
    let val      = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}

/// Up to `n` items drawn without replacement, in random order.
/// `n == 0` or `n >= len` returns every item.
pub fn sample_subset<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    if n == 0 || n >= items.len() {
        return items.to_vec();
    }
    let mut rng = rand::thread_rng();
    items.choose_multiple(&mut rng, n).cloned().collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::qa_pair::QaPair;
    use crate::domain::span::AnswerSpan;
    use std::collections::HashSet;

    fn pairs(n: u32) -> Vec<QaPair> {
        (0..n)
            .map(|i| QaPair::new(vec![i + 3], vec![i + 3, 7], Some(AnswerSpan::new(0, 0))))
            .collect()
    }

    #[test]
    fn test_holds_out_a_tenth_of_pairs() {
        let (train, val) = split_train_val(pairs(50), 0.9);
        assert_eq!(train.len(), 45);
        assert_eq!(val.len(), 5);

        let mut seen: Vec<u32> = train.iter().chain(&val).map(|p| p.question_ids[0]).collect();
        seen.sort_unstable();
        assert_eq!(seen, (3..53).collect::<Vec<_>>());
    }

    #[test]
    fn test_tiny_split_keeps_everything_for_training() {
        let (train, val) = split_train_val(pairs(3), 0.9);
        assert_eq!(train.len(), 3);
        assert!(val.is_empty());

        let (train, val) = split_train_val(Vec::<QaPair>::new(), 0.9);
        assert!(train.is_empty() && val.is_empty());
    }

    #[test]
    fn test_subset_draws_distinct_items() {
        let items: Vec<usize> = (0..20).collect();
        let subset = sample_subset(&items, 5);
        assert_eq!(subset.len(), 5);
        assert_eq!(subset.iter().collect::<HashSet<_>>().len(), 5);
        assert_eq!(sample_subset(&items, 0).len(), 20);
        assert_eq!(sample_subset(&items, 50).len(), 20);
    }
}
