use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::padding::pad_sequence;
use crate::domain::qa_pair::QaPair;
use crate::domain::span::AnswerSpan;

/// One padded example. Ids are padded to the configured maximum
/// lengths; the `*_length` fields count the real tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaSample {
    pub question_ids:    Vec<u32>,
    pub question_length: usize,
    pub context_ids:     Vec<u32>,
    pub context_length:  usize,
    pub span:            Option<AnswerSpan>,
    /// Gold answer ids taken before truncation, so answers cut off
    /// by the context limit still have a reference text
    pub gold_answer:     Option<Vec<u32>>,
}

impl QaSample {
    pub fn new(
        question_ids:    Vec<u32>,
        question_length: usize,
        context_ids:     Vec<u32>,
        context_length:  usize,
        span:            Option<AnswerSpan>,
    ) -> Self {
        let gold_answer = span
            .filter(|s| s.fits(context_length))
            .map(|s| s.slice(&context_ids[..context_length]).to_vec());
        Self { question_ids, question_length, context_ids, context_length, span, gold_answer }
    }

    pub fn from_pair(pair: &QaPair, max_question_length: usize, max_context_length: usize) -> Self {
        let (question_ids, question_length) = pad_sequence(&pair.question_ids, max_question_length);
        let (context_ids, context_length)   = pad_sequence(&pair.context_ids, max_context_length);
        Self {
            gold_answer: pair.answer_ids().map(<[u32]>::to_vec),
            ..Self::new(question_ids, question_length, context_ids, context_length, pair.span)
        }
    }

    /// True if the gold span survived context truncation.
    pub fn is_answerable(&self) -> bool {
        self.span.is_some_and(|s| s.fits(self.context_length))
    }

    /// True if the sample carries a gold answer, truncated or not.
    pub fn is_labelled(&self) -> bool {
        self.gold_answer.is_some()
    }

    pub fn answer_ids(&self) -> Option<&[u32]> {
        self.gold_answer.as_deref()
    }
}

pub struct QaDataset {
    samples: Vec<QaSample>,
}

impl QaDataset {
    pub fn new(samples: Vec<QaSample>) -> Self { Self { samples } }

    /// Pad every pair; examples whose answer was cut off by the
    /// context limit are dropped.
    pub fn for_training(pairs: &[QaPair], max_question_length: usize, max_context_length: usize) -> Self {
        let total = pairs.len();
        let samples: Vec<QaSample> = pairs
            .iter()
            .map(|p| QaSample::from_pair(p, max_question_length, max_context_length))
            .filter(QaSample::is_answerable)
            .collect();

        if samples.len() < total {
            tracing::info!(
                "Dropped {} of {} examples whose answer lies past {} context tokens",
                total - samples.len(),
                total,
                max_context_length
            );
        }
        Self { samples }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn samples(&self) -> &[QaSample] { &self.samples }
}

impl Dataset<QaSample> for QaDataset {
    fn get(&self, index: usize) -> Option<QaSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
