// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Turns the preprocessed SQuAD id files into device batches.
//
//   {split}.ids.question / .ids.context / .span
//       │
//       ▼
//   SquadLoader       → parses id lines into QaPairs
//       │
//       ▼
//   pad_sequence      → truncates/pads to the configured lengths
//       │
//       ▼
//   QaDataset         → implements Burn's Dataset trait
//       │
//       ▼
//   QaBatcher         → stacks samples, builds pointer targets
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads pre-tokenised SQuAD split files
pub mod loader;

/// Fixed-width truncation and padding
pub mod padding;

/// Implements Burn's Dataset trait for Q&A samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
