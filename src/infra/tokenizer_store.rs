// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Maps free text (the `ask` command) onto the same ids the
// preprocessed SQuAD files use.
//
// The vocabulary is fixed by preprocessing, so nothing is trained
// here: a WordLevel tokenizer JSON is written straight from
// vocab.dat and loaded back with Tokenizer::from_file.
//
//   normaliser     BertNormalizer (lowercase, clean text)
//   pre-tokeniser  Whitespace (splits words and punctuation)
//   model          WordLevel { vocab: token → line number, unk: <unk> }
//
// The JSON is saved in the train dir next to the checkpoints so
// a trained model always travels with its tokenizer.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::infra::vocab::{Vocabulary, UNK_TOKEN};

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("tokenizer.json")
    }

    /// Load the saved tokenizer, or build it from `vocab` if absent.
    pub fn load_or_build(&self, vocab: &Vocabulary) -> Result<Tokenizer> {
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building word-level tokenizer ({} tokens)", vocab.len());
            self.build_and_save(vocab)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    pub fn build_and_save(&self, vocab: &Vocabulary) -> Result<Tokenizer> {
        if vocab.id(UNK_TOKEN).is_none() {
            bail!("Vocabulary has no '{UNK_TOKEN}' token");
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let mut table = serde_json::Map::new();
        for (id, token) in vocab.tokens().iter().enumerate() {
            if !table.contains_key(token) {
                table.insert(token.clone(), serde_json::json!(id));
            }
        }

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": table,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.path();
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer JSON to '{}'", path.display()))?;

        tracing::info!("Tokenizer saved to '{}'", path.display());
        self.load()
    }
}

/// Token ids of `text`, without special tokens.
pub fn encode_ids(tokenizer: &Tokenizer, text: &str) -> Result<Vec<u32>> {
    let encoding = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow::anyhow!("Tokenisation failed: {e}"))?;
    Ok(encoding.get_ids().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn vocab() -> Vocabulary {
        Vocabulary::from_tokens(["<pad>", "<sos>", "<unk>", "the", "tower", "opened", "in", "1889", "."])
    }

    #[test]
    fn test_maps_text_onto_vocabulary_ids() {
        let dir   = tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok   = store.load_or_build(&vocab()).unwrap();

        let ids = encode_ids(&tok, "The Tower opened in 1889.").unwrap();
        assert_eq!(ids, vec![3, 4, 5, 6, 7, 8]);

        let unknown = encode_ids(&tok, "the bridge").unwrap();
        assert_eq!(unknown, vec![3, 2]);
    }

    #[test]
    fn test_reloads_saved_tokenizer() {
        let dir   = tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        store.build_and_save(&vocab()).unwrap();
        assert!(dir.path().join("tokenizer.json").exists());

        let tok = store.load().unwrap();
        assert_eq!(encode_ids(&tok, "tower").unwrap(), vec![4]);
    }

    #[test]
    fn test_vocabulary_without_unk_is_rejected() {
        let dir = tempdir().unwrap();
        let err = TokenizerStore::new(dir.path()).build_and_save(&Vocabulary::from_tokens(["a"]));
        assert!(err.is_err());
    }
}
