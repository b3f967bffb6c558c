// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting persistence used by training and evaluation:
//
//   checkpoint.rs  - model weights (Burn CompactRecorder) plus the
//                    train and model configs as JSON
//
//   metrics.rs     - per-epoch loss / ROC-AUC rows in a csv file

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics csv logger
pub mod metrics;
