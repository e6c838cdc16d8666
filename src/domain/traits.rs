// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer reads examples through this trait, never
// through a concrete loader:
//
//   DatasetSource  ← SquadLoader (pre-tokenised id files)
//                  ← in-memory sources in tests
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::qa_pair::QaPair;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can produce the examples of a named split
/// ("train", "val", ...).
pub trait DatasetSource {
    fn load_split(&self, split: &str) -> Result<Vec<QaPair>>;

    /// True if the split exists in this source.
    fn has_split(&self, split: &str) -> bool;
}
