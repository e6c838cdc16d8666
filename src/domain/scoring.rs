// ============================================================
// Layer 3 — Answer Scoring (SQuAD F1 / Exact Match)
// ============================================================
// Both metrics compare NORMALISED answer strings:
//   1. lowercase
//   2. drop ASCII punctuation
//   3. drop the articles "a", "an", "the"
//   4. collapse whitespace
//
// Exact match: normalised strings are identical.
// F1: harmonic mean of token-bag precision and recall.
//
// Example:
//   prediction "The Eiffel tower"  truth "eiffel tower!"  → EM 1, F1 1.0
//   prediction "tower in Paris"    truth "Eiffel tower"   → EM 0, F1 0.4
//
// Reference: Rajpurkar et al. (2016) SQuAD evaluation script

use std::collections::HashMap;

const ARTICLES: [&str; 3] = ["a", "an", "the"];

pub fn normalize_answer(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    lowered
        .split_whitespace()
        .filter(|w| !ARTICLES.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn exact_match_score(prediction: &str, ground_truth: &str) -> bool {
    normalize_answer(prediction) == normalize_answer(ground_truth)
}

pub fn f1_score(prediction: &str, ground_truth: &str) -> f64 {
    let pred_norm  = normalize_answer(prediction);
    let truth_norm = normalize_answer(ground_truth);
    let pred:  Vec<&str> = pred_norm.split_whitespace().collect();
    let truth: Vec<&str> = truth_norm.split_whitespace().collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &truth {
        *counts.entry(*token).or_insert(0) += 1;
    }
    let mut same = 0usize;
    for token in &pred {
        if let Some(n) = counts.get_mut(token) {
            if *n > 0 {
                *n -= 1;
                same += 1;
            }
        }
    }

    if same == 0 {
        return 0.0;
    }
    let precision = same as f64 / pred.len() as f64;
    let recall    = same as f64 / truth.len() as f64;
    2.0 * precision * recall / (precision + recall)
}

/// Running mean of F1 and EM over a set of predictions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreSummary {
    pub f1:    f64,
    pub em:    f64,
    pub count: usize,
}

impl ScoreSummary {
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (mut f1, mut em, mut count) = (0.0, 0.0, 0usize);
        for (prediction, truth) in pairs {
            f1 += f1_score(prediction, truth);
            if exact_match_score(prediction, truth) {
                em += 1.0;
            }
            count += 1;
        }
        if count == 0 {
            return Self::default();
        }
        Self { f1: f1 / count as f64, em: em / count as f64, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalisation() {
        assert_eq!(normalize_answer("  The  Eiffel, Tower! "), "eiffel tower");
        assert_eq!(normalize_answer("an apple a day"), "apple day");
    }

    #[test]
    fn test_exact_match_ignores_case_and_articles() {
        assert!(exact_match_score("The Eiffel tower", "eiffel tower!"));
        assert!(!exact_match_score("tower", "eiffel tower"));
    }

    #[test]
    fn test_partial_overlap_f1() {
        // 1 shared token, precision 1/3, recall 1/2 → F1 0.4
        let f1 = f1_score("tower in Paris", "Eiffel tower");
        assert!((f1 - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_tokens_counted_once_per_match() {
        let f1 = f1_score("paris paris paris", "paris");
        // precision 1/3, recall 1
        assert!((f1 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap_is_zero() {
        assert_eq!(f1_score("london", "paris"), 0.0);
        assert_eq!(f1_score("", "paris"), 0.0);
    }

    #[test]
    fn test_summary_averages() {
        let s = ScoreSummary::from_pairs(vec![("paris", "Paris"), ("london", "paris")]);
        assert_eq!(s.count, 2);
        assert!((s.em - 0.5).abs() < 1e-9);
        assert!((s.f1 - 0.5).abs() < 1e-9);
        assert_eq!(ScoreSummary::from_pairs(Vec::<(&str, &str)>::new()), ScoreSummary::default());
    }
}
