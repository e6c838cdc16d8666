// ============================================================
// Layer 6 — Pretrained Word Vectors
// ============================================================
// Two sources of pretrained vectors, picked by file extension:
//
//   glove.trimmed.{d}.npz   array "glove", shape [vocab_size, d],
//                           row i already aligned with vocab id i
//                           (written by the SQuAD preprocessing)
//   glove.6B.{d}d.txt       raw GloVe text, aligned here
//
// Text vectors look like
//
//   the 0.418 0.24968 -0.41242 ...
//   ,   0.013441 0.23682 -0.16899 ...
//
// and are laid out as an embedding table aligned with the
// vocabulary: row i holds the vector of vocabulary token i.
//
//   - tokens with no vector get small uniform random values
//   - row 0 (padding) is all zeros
//   - a vector with the wrong number of values is an error
//
// A token with no exact match borrows the vector of its
// lowercase form (GloVe 6B is lowercase only).
//
// Reference: Pennington et al. (2014) GloVe

use anyhow::{bail, Context, Result};
use burn::prelude::*;
use npyz::{npz::NpzArchive, DType};
use rand::Rng;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::infra::vocab::Vocabulary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    None,
    Lowercase,
    Exact,
}

/// Half-width of the uniform range for tokens without a vector.
const RANDOM_SCALE: f32 = 0.1;

/// Array name inside a trimmed `.npz` table.
pub const NPZ_KEY: &str = "glove";

/// Row-major [vocab_size, dim] table.
#[derive(Debug, Clone)]
pub struct EmbeddingMatrix {
    pub vocab_size: usize,
    pub dim:        usize,
    pub values:     Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(self.values.as_slice(), device)
            .reshape([self.vocab_size, self.dim])
    }
}

/// Vectors for `vocab` from a trimmed `.npz` table, or from a GloVe
/// text file for any other extension.
pub fn load_embeddings<R: Rng>(
    path:  impl AsRef<Path>,
    vocab: &Vocabulary,
    dim:   usize,
    rng:   &mut R,
) -> Result<EmbeddingMatrix> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == "npz") {
        load_trimmed_npz(path, vocab, dim)
    } else {
        load_glove(path, vocab, dim, rng)
    }
}

/// Read the `glove` array of a trimmed table; its shape must be
/// exactly [vocab.len(), dim].
pub fn load_trimmed_npz(
    path:  impl AsRef<Path>,
    vocab: &Vocabulary,
    dim:   usize,
) -> Result<EmbeddingMatrix> {
    let path = path.as_ref();
    let mut archive = NpzArchive::open(path)
        .with_context(|| format!("Cannot open word vectors '{}'", path.display()))?;
    let array = archive
        .by_name(NPZ_KEY)
        .with_context(|| format!("Cannot read '{}'", path.display()))?
        .with_context(|| format!("'{}' has no '{NPZ_KEY}' array", path.display()))?;

    let shape = array.shape().to_vec();
    let &[rows, cols] = shape.as_slice() else {
        bail!("'{}': expected a 2-D table, got shape {:?}", path.display(), shape);
    };
    if rows as usize != vocab.len() || cols as usize != dim {
        bail!(
            "'{}' is {rows}x{cols}, expected {}x{dim} (vocabulary x embedding_size)",
            path.display(),
            vocab.len()
        );
    }

    let single = matches!(array.dtype(), DType::Plain(ref ts) if ts.to_string() == "<f4");
    let values: Vec<f32> = (if single {
        array.into_vec::<f32>()
    } else {
        array
            .into_vec::<f64>()
            .map(|v| v.into_iter().map(|x| x as f32).collect())
    })
    .with_context(|| format!("'{}': '{NPZ_KEY}' must hold floats", path.display()))?;

    tracing::info!("Word vectors: {rows}x{cols} table from '{}'", path.display());
    Ok(EmbeddingMatrix { vocab_size: vocab.len(), dim, values })
}

pub fn load_glove<R: Rng>(
    path:  impl AsRef<Path>,
    vocab: &Vocabulary,
    dim:   usize,
    rng:   &mut R,
) -> Result<EmbeddingMatrix> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Cannot open word vectors '{}'", path.display()))?;

    // Tokens whose lowercase form differs, keyed by that form
    let mut by_lowercase: HashMap<String, Vec<usize>> = HashMap::new();
    for (id, tok) in vocab.tokens().iter().enumerate() {
        let lower = tok.to_lowercase();
        if lower != *tok {
            by_lowercase.entry(lower).or_default().push(id);
        }
    }

    let mut values = vec![0.0f32; vocab.len() * dim];
    let mut found  = vec![Match::None; vocab.len()];

    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("{}:{}", path.display(), n + 1))?;
        let mut parts = line.split(' ');
        let Some(word) = parts.next() else { continue };
        if word.is_empty() {
            continue;
        }

        let mut targets: Vec<(usize, Match)> = Vec::new();
        if let Some(id) = vocab.id(word) {
            targets.push((id as usize, Match::Exact));
        }
        if let Some(ids) = by_lowercase.get(word) {
            targets.extend(
                ids.iter()
                    .filter(|&&id| found[id] == Match::None)
                    .map(|&id| (id, Match::Lowercase)),
            );
        }
        if targets.is_empty() {
            continue;
        }

        let vector: Vec<f32> = parts
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<f32>())
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("{}:{}: bad vector value", path.display(), n + 1))?;
        if vector.len() != dim {
            bail!(
                "{}:{}: vector for '{word}' has {} values, expected {dim}",
                path.display(),
                n + 1,
                vector.len()
            );
        }

        for (id, how) in targets {
            values[id * dim..(id + 1) * dim].copy_from_slice(&vector);
            found[id] = how;
        }
    }

    let mut missing = 0usize;
    for (id, hit) in found.iter().enumerate() {
        if *hit != Match::None || id == 0 {
            continue;
        }
        missing += 1;
        for v in &mut values[id * dim..(id + 1) * dim] {
            *v = rng.gen_range(-RANDOM_SCALE..RANDOM_SCALE);
        }
    }
    if !vocab.is_empty() {
        values[..dim].fill(0.0);
    }

    tracing::info!(
        "Word vectors: {} of {} tokens found in '{}', {} randomly initialised",
        vocab.len() - missing,
        vocab.len(),
        path.display(),
        missing
    );

    Ok(EmbeddingMatrix { vocab_size: vocab.len(), dim, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use npyz::WriterBuilder;
    use rand::{rngs::StdRng, SeedableRng};
    use std::fs;
    use tempfile::tempdir;

    fn vocab() -> Vocabulary {
        Vocabulary::from_tokens(["<pad>", "<unk>", "the", "Paris", "zzz"])
    }

    fn row(m: &EmbeddingMatrix, id: usize) -> &[f32] {
        &m.values[id * m.dim..(id + 1) * m.dim]
    }

    fn write_npz<T: npyz::AutoSerialize>(path: &Path, shape: &[u64], values: Vec<T>) {
        let mut npz    = npyz::npz::NpzWriter::create(path).unwrap();
        let mut writer = npz
            .array(NPZ_KEY, Default::default())
            .unwrap()
            .default_dtype()
            .shape(shape)
            .begin_nd()
            .unwrap();
        writer.extend(values).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_trimmed_npz_is_read_row_per_id() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("glove.trimmed.3.npz");
        let values: Vec<f64> = (0..15).map(|i| i as f64 / 10.0).collect();
        write_npz(&path, &[5, 3], values);

        let mut rng = StdRng::seed_from_u64(7);
        let m = load_embeddings(&path, &vocab(), 3, &mut rng).unwrap();
        assert_eq!((m.vocab_size, m.dim), (5, 3));
        assert_eq!(row(&m, 3), &[0.9, 1.0, 1.1]);
    }

    #[test]
    fn test_trimmed_npz_accepts_single_precision() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("glove.trimmed.3.npz");
        write_npz(&path, &[5, 3], vec![0.5f32; 15]);

        let m = load_trimmed_npz(&path, &vocab(), 3).unwrap();
        assert!(m.values.iter().all(|v| *v == 0.5));
    }

    #[test]
    fn test_trimmed_npz_shape_must_match() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("glove.trimmed.4.npz");
        write_npz(&path, &[5, 4], vec![0.0f64; 20]);

        let err = format!("{:#}", load_trimmed_npz(&path, &vocab(), 3).unwrap_err());
        assert!(err.contains("5x4"), "{err}");
    }

    #[test]
    fn test_rows_align_with_vocabulary() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("glove.txt");
        fs::write(&path, "the 0.1 0.2 0.3\nparis 1 2 3\n<pad> 9 9 9\nextra 5 5 5\n").unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let m = load_embeddings(&path, &vocab(), 3, &mut rng).unwrap();

        assert_eq!((m.vocab_size, m.dim), (5, 3));
        assert_eq!(row(&m, 0), &[0.0, 0.0, 0.0]);
        assert_eq!(row(&m, 2), &[0.1, 0.2, 0.3]);
        assert_eq!(row(&m, 3), &[1.0, 2.0, 3.0]);
        assert!(row(&m, 4).iter().all(|v| v.abs() < RANDOM_SCALE));
        assert!(row(&m, 4).iter().any(|v| *v != 0.0));

        let t = m.to_tensor::<NdArray>(&Default::default());
        assert_eq!(t.dims(), [5, 3]);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let dir  = tempdir().unwrap();
        let path = dir.path().join("glove.txt");
        fs::write(&path, "the 0.1 0.2\n").unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        assert!(load_glove(&path, &vocab(), 3, &mut rng).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(load_glove("/nonexistent/glove.txt", &vocab(), 3, &mut rng).is_err());
    }
}
