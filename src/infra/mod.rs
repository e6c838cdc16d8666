// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting file formats and persistence:
//
//   vocab.rs           — vocab.dat id ↔ token table
//
//   embeddings.rs      — GloVe text vectors aligned to the
//                        vocabulary as an embedding table
//
//   tokenizer_store.rs — WordLevel tokenizer built from the
//                        vocabulary, for free-text questions
//
//   checkpoint.rs      — model weights (Burn CompactRecorder),
//                        latest epoch pointer, model and
//                        training configs
//
//   metrics.rs         — per-epoch loss/F1/EM CSV
//
//   logging.rs         — tracing subscriber setup, optional
//                        log.txt copy in the log dir
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Vocabulary file loading and id rendering
pub mod vocab;

/// Pretrained word vector loading
pub mod embeddings;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// Tracing subscriber and log file setup
pub mod logging;
