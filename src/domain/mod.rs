// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust types and functions describing extractive QA:
// examples, answer spans, and how answers are scored.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A tokenised question/context pair with its answer span
pub mod qa_pair;

// Answer spans, pointer targets, and span decoding
pub mod span;

// SQuAD F1 / exact-match scoring
pub mod scoring;

// Core abstractions (traits) that other layers implement
pub mod traits;
