// ============================================================
// Layer 6 — Vocabulary
// ============================================================
// The id ↔ token table produced by SQuAD preprocessing.
//
// File format (vocab.dat): one token per line, id = line number.
//   line 0  <pad>
//   line 1  <sos>
//   line 2  <unk>
//   line 3  the
//   ...
//
// Used to:
//   - align pretrained word vectors with embedding rows
//   - render predicted/gold token spans back into text for F1/EM
//   - build the free-text tokenizer (see tokenizer_store.rs)

use anyhow::{bail, Context, Result};
use std::{collections::HashMap, fs, path::Path};

pub const UNK_TOKEN: &str = "<unk>";

#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: Vec<String>,
    ids:    HashMap<String, u32>,
}

impl Vocabulary {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("Vocabulary file '{}' not found", path.display());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary '{}'", path.display()))?;
        let vocab = Self::from_tokens(text.lines().map(|l| l.trim_end_matches('\r').to_string()));

        tracing::info!("Loaded vocabulary of {} tokens from '{}'", vocab.len(), path.display());
        Ok(vocab)
    }

    /// Build from tokens in id order. A repeated token keeps its first id.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let mut ids = HashMap::with_capacity(tokens.len());
        for (i, tok) in tokens.iter().enumerate() {
            ids.entry(tok.clone()).or_insert(i as u32);
        }
        Self { tokens, ids }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    pub fn id(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Space-joined tokens; unknown ids render as `<unk>`.
    pub fn render(&self, ids: &[u32]) -> String {
        ids.iter()
            .map(|&id| self.token(id).unwrap_or(UNK_TOKEN))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_assigns_line_numbers() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("vocab.dat");
        fs::write(&path, "<pad>\n<sos>\n<unk>\nthe\ntower\n").unwrap();

        let vocab = Vocabulary::load(&path).unwrap();
        assert_eq!(vocab.len(), 5);
        assert_eq!(vocab.id("the"), Some(3));
        assert_eq!(vocab.token(4), Some("tower"));
        assert_eq!(vocab.render(&[3, 4, 99]), "the tower <unk>");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(Vocabulary::load(dir.path().join("nope.dat")).is_err());
    }

    #[test]
    fn test_duplicate_token_keeps_first_id() {
        let vocab = Vocabulary::from_tokens(["a", "b", "a"]);
        assert_eq!(vocab.id("a"), Some(0));
        assert_eq!(vocab.len(), 3);
    }
}
