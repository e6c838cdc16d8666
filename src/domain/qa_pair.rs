// ============================================================
// Layer 3 — QaPair Domain Type
// ============================================================
// One reading-comprehension example as it comes off disk:
// a tokenised question, a tokenised context paragraph, and
// (for labelled splits) the answer span inside the context.
//
// Token ids index into the vocabulary file; the span indexes
// into context_ids, NOT into the raw paragraph text.
//
// Example:
//   question_ids: [12, 7, 901]          "when was it"
//   context_ids:  [5, 88, 4, 1907, 3]   "it opened in 1907 ."
//   span:         Some(3..=3)           → "1907"
//
// Reference: Rajpurkar et al. (2016) SQuAD

use serde::{Deserialize, Serialize};

use crate::domain::span::AnswerSpan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question_ids: Vec<u32>,
    pub context_ids:  Vec<u32>,
    /// Gold answer span; None for unlabelled input
    pub span:         Option<AnswerSpan>,
}

impl QaPair {
    pub fn new(question_ids: Vec<u32>, context_ids: Vec<u32>, span: Option<AnswerSpan>) -> Self {
        Self { question_ids, context_ids, span }
    }

    /// Gold answer token ids, if labelled and in range.
    pub fn answer_ids(&self) -> Option<&[u32]> {
        self.span
            .filter(|s| s.fits(self.context_ids.len()))
            .map(|s| s.slice(&self.context_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_ids() {
        let pair = QaPair::new(vec![1], vec![5, 88, 4, 1907, 3], Some(AnswerSpan::new(3, 3)));
        assert_eq!(pair.answer_ids(), Some(&[1907u32][..]));
    }

    #[test]
    fn test_out_of_range_span_has_no_answer() {
        let pair = QaPair::new(vec![1], vec![5, 88], Some(AnswerSpan::new(1, 4)));
        assert_eq!(pair.answer_ids(), None);
    }
}
