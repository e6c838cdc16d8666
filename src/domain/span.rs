// ============================================================
// Layer 3 — Answer Spans
// ============================================================
// An answer is a SPAN of context tokens: [start, end] inclusive.
//
// The Answer-Pointer decoder can produce that span two ways:
//
//   Boundary  → two pointer steps: start token, then end token
//   Sequence  → one pointer step per answer token, followed by
//               the end-of-answer sentinel
//
// The sentinel is the extra position appended after the last
// real context token, i.e. index == context_length.
//
// Example (context_length = 6, span = 2..=4, 5 sequence steps):
//   Boundary targets:  [2, 4]
//   Sequence targets:  [2, 3, 4, 6, 6]
//
// Reference: Wang & Jiang (2016) §2.2 (sequence vs boundary model)

use serde::{Deserialize, Serialize};

/// Inclusive token span within the context passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSpan {
    pub start: usize,
    pub end:   usize,
}

impl AnswerSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// True if the span lies within the first `context_length` tokens.
    pub fn fits(&self, context_length: usize) -> bool {
        self.start <= self.end && self.end < context_length
    }

    /// The span's tokens from a context sequence.
    pub fn slice<'a, T>(&self, context: &'a [T]) -> &'a [T] {
        let end = (self.end + 1).min(context.len());
        let start = self.start.min(end);
        &context[start..end]
    }
}

/// How the Answer-Pointer decoder emits a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerMode {
    Boundary,
    Sequence,
}

impl PointerMode {
    /// Number of pointer steps the decoder unrolls.
    pub fn steps(&self, max_answer_length: usize) -> usize {
        match self {
            PointerMode::Boundary => 2,
            PointerMode::Sequence => max_answer_length + 1,
        }
    }
}

/// Per-step pointer targets for a gold span.
/// Sequence spans longer than `steps - 1` tokens are cut short.
pub fn pointer_targets(
    span:           AnswerSpan,
    context_length: usize,
    mode:           PointerMode,
    steps:          usize,
) -> Vec<usize> {
    match mode {
        PointerMode::Boundary => vec![span.start, span.end],
        PointerMode::Sequence => {
            let sentinel = context_length;
            let tokens   = (span.start..=span.end).take(steps.saturating_sub(1));
            tokens
                .chain(std::iter::repeat(sentinel))
                .take(steps)
                .collect()
        }
    }
}

/// Highest-scoring span under p_start(s) · p_end(e) with
/// s <= e < length and e - s < max_answer_length.
/// Returns the span and its score.
pub fn best_boundary_span(
    start_probs:       &[f32],
    end_probs:         &[f32],
    length:            usize,
    max_answer_length: usize,
) -> (AnswerSpan, f32) {
    let length = length.min(start_probs.len()).min(end_probs.len());
    let mut best       = AnswerSpan::new(0, 0);
    let mut best_score = f32::NEG_INFINITY;

    for s in 0..length {
        for e in s..(s + max_answer_length.max(1)).min(length) {
            let score = start_probs[s] * end_probs[e];
            if score > best_score {
                best_score = score;
                best       = AnswerSpan::new(s, e);
            }
        }
    }

    (best, best_score.max(0.0))
}

/// Span covered by the tokens pointed at before the first sentinel.
/// If the very first step picks the sentinel, the best non-sentinel
/// position of that step is used instead.
pub fn span_from_sequence(step_probs: &[Vec<f32>], length: usize) -> (AnswerSpan, f32) {
    let mut picked     = Vec::new();
    let mut confidence = 1.0f32;

    for probs in step_probs {
        let (idx, p) = argmax(&probs[..(length + 1).min(probs.len())]);
        if idx >= length {
            break;
        }
        picked.push(idx);
        confidence *= p;
    }

    match (picked.iter().min(), picked.iter().max()) {
        (Some(&start), Some(&end)) => (AnswerSpan::new(start, end), confidence),
        _ => {
            let first = step_probs.first().map(|p| &p[..length.min(p.len())]).unwrap_or(&[]);
            if first.is_empty() {
                return (AnswerSpan::new(0, 0), 0.0);
            }
            let (idx, p) = argmax(first);
            (AnswerSpan::new(idx, idx), p)
        }
    }
}

fn argmax(values: &[f32]) -> (usize, f32) {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_targets() {
        let t = pointer_targets(AnswerSpan::new(2, 4), 6, PointerMode::Boundary, 2);
        assert_eq!(t, vec![2, 4]);
    }

    #[test]
    fn test_sequence_targets_end_with_sentinel() {
        let t = pointer_targets(AnswerSpan::new(2, 4), 6, PointerMode::Sequence, 5);
        assert_eq!(t, vec![2, 3, 4, 6, 6]);
    }

    #[test]
    fn test_sequence_targets_truncate_long_answers() {
        let t = pointer_targets(AnswerSpan::new(0, 9), 12, PointerMode::Sequence, 4);
        assert_eq!(t, vec![0, 1, 2, 12]);
    }

    #[test]
    fn test_best_boundary_span_respects_order_and_length() {
        // end mass sits before the start mass; only s <= e is allowed
        let start = [0.1, 0.1, 0.7, 0.1];
        let end   = [0.6, 0.1, 0.1, 0.2];
        let (span, score) = best_boundary_span(&start, &end, 4, 30);
        assert_eq!(span, AnswerSpan::new(2, 3));
        assert!((score - 0.14).abs() < 1e-6);

        let (short, _) = best_boundary_span(&start, &end, 4, 1);
        assert_eq!(short, AnswerSpan::new(2, 2));
    }

    #[test]
    fn test_best_boundary_span_ignores_padding() {
        let start = [0.2, 0.1, 0.0, 0.7];
        let end   = [0.1, 0.2, 0.0, 0.7];
        let (span, _) = best_boundary_span(&start, &end, 2, 30);
        assert!(span.end < 2);
    }

    #[test]
    fn test_span_from_sequence_stops_at_sentinel() {
        let steps = vec![
            vec![0.1, 0.8, 0.05, 0.05],
            vec![0.1, 0.1, 0.7, 0.1],
            vec![0.1, 0.1, 0.1, 0.7],
            vec![0.9, 0.0, 0.0, 0.1],
        ];
        let (span, conf) = span_from_sequence(&steps, 3);
        assert_eq!(span, AnswerSpan::new(1, 2));
        assert!((conf - 0.56).abs() < 1e-6);
    }

    #[test]
    fn test_span_from_sequence_falls_back_when_first_step_is_sentinel() {
        let steps = vec![vec![0.1, 0.3, 0.6]];
        let (span, conf) = span_from_sequence(&steps, 2);
        assert_eq!(span, AnswerSpan::new(1, 1));
        assert!((conf - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_span_slice_and_fit() {
        let tokens = ["a", "b", "c", "d"];
        let span   = AnswerSpan::new(1, 2);
        assert_eq!(span.slice(&tokens), &["b", "c"]);
        assert!(span.fits(3));
        assert!(!span.fits(2));
        assert_eq!(span.len(), 2);
    }
}
