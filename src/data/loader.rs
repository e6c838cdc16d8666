// ============================================================
// Layer 4 — SQuAD Id-File Loader
// ============================================================
// Reads the preprocessed SQuAD splits from a data directory.
// Each split is three parallel text files, one example per line:
//
//   {split}.ids.question   "12 7 901"          question token ids
//   {split}.ids.context    "5 88 4 1907 3"     context token ids
//   {split}.span           "3 3"               answer start/end (inclusive)
//
// The span file is optional: without it the examples carry no
// gold answer and can only be used for prediction.
//
// Line counts must agree across the files; a mismatch means the
// preprocessing step went wrong, so it is reported as an error
// rather than silently truncated. With a vocabulary size set, every
// id must also index into the vocabulary.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (Reading a File)

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::qa_pair::QaPair;
use crate::domain::span::AnswerSpan;
use crate::domain::traits::DatasetSource;

/// Loads pre-tokenised SQuAD splits from `dir`.
/// Implements the DatasetSource trait from Layer 3.
pub struct SquadLoader {
    dir:        PathBuf,
    vocab_size: Option<usize>,
}

impl SquadLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), vocab_size: None }
    }

    /// Reject token ids `>= vocab_size`.
    pub fn with_vocab_size(mut self, vocab_size: usize) -> Self {
        self.vocab_size = Some(vocab_size);
        self
    }

    fn split_path(&self, split: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{split}.{suffix}"))
    }

    fn read_token_ids(&self, path: &Path) -> Result<Vec<Vec<u32>>> {
        let lines = read_id_lines(path)?;
        if let Some(limit) = self.vocab_size {
            for (n, ids) in lines.iter().enumerate() {
                if let Some(bad) = ids.iter().find(|&&id| id as usize >= limit) {
                    bail!(
                        "{}:{}: token id {bad} is outside the vocabulary ({limit} tokens)",
                        path.display(),
                        n + 1
                    );
                }
            }
        }
        Ok(lines)
    }
}

impl DatasetSource for SquadLoader {
    fn load_split(&self, split: &str) -> Result<Vec<QaPair>> {
        let questions = self.read_token_ids(&self.split_path(split, "ids.question"))?;
        let contexts  = self.read_token_ids(&self.split_path(split, "ids.context"))?;

        if questions.len() != contexts.len() {
            bail!(
                "split '{split}': {} questions but {} contexts",
                questions.len(),
                contexts.len()
            );
        }

        let span_path = self.split_path(split, "span");
        let spans: Vec<Option<AnswerSpan>> = if span_path.exists() {
            let spans = read_spans(&span_path)?;
            if spans.len() != questions.len() {
                bail!(
                    "split '{split}': {} questions but {} spans",
                    questions.len(),
                    spans.len()
                );
            }
            spans.into_iter().map(Some).collect()
        } else {
            tracing::warn!("No span file for split '{split}'; examples are unlabelled");
            vec![None; questions.len()]
        };

        let pairs: Vec<QaPair> = questions
            .into_iter()
            .zip(contexts)
            .zip(spans)
            .map(|((q, c), span)| QaPair::new(q, c, span))
            .collect();

        tracing::info!("Loaded {} examples from split '{split}'", pairs.len());
        Ok(pairs)
    }

    fn has_split(&self, split: &str) -> bool {
        self.split_path(split, "ids.question").exists()
            && self.split_path(split, "ids.context").exists()
    }
}

/// Parse one line of space-separated integers.
pub fn parse_ids(line: &str) -> Result<Vec<u32>> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<u32>()
                .with_context(|| format!("'{tok}' is not a token id"))
        })
        .collect()
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(text.lines().map(str::to_owned).collect())
}

fn read_id_lines(path: &Path) -> Result<Vec<Vec<u32>>> {
    read_lines(path)?
        .iter()
        .enumerate()
        .map(|(n, line)| {
            parse_ids(line).with_context(|| format!("{}:{}", path.display(), n + 1))
        })
        .collect()
}

fn read_spans(path: &Path) -> Result<Vec<AnswerSpan>> {
    read_id_lines(path)?
        .into_iter()
        .enumerate()
        .map(|(n, ids)| match ids.as_slice() {
            [start, end] if start <= end => Ok(AnswerSpan::new(*start as usize, *end as usize)),
            _ => bail!("{}:{}: expected 'start end', got {:?}", path.display(), n + 1, ids),
        })
        .collect()
}
