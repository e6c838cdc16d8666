// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, evaluating, answering a question).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern

// The training workflow
pub mod train_use_case;

// Scoring a checkpoint on a split
pub mod evaluate_use_case;

// Free-text question answering
pub mod ask_use_case;

#[cfg(test)]
pub(crate) mod fixtures;
