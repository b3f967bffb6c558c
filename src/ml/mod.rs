// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here.
//
//   ecc.rs       - edge-conditioned convolution: a small network
//                  maps each bond's features to a weight matrix
//                  applied to the neighbouring atom
//
//   pool.rs      - global sum pooling, node rows → graph rows
//
//   model.rs     - ECC stack + sum pool + dense logit head
//
//   trainer.rs   - Adam loop with per-epoch validation and
//                  checkpointing
//
//   evaluator.rs - ROC-AUC and loss over a split
//
// Reference: Simonovsky & Komodakis (2017) Dynamic Edge-Conditioned
//            Filters in Convolutional Neural Networks on Graphs

/// Edge-conditioned convolution layer
pub mod ecc;

/// Graph readout
pub mod pool;

/// Molecule classifier architecture
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// ROC-AUC evaluation
pub mod evaluator;

#[cfg(not(feature = "wgpu"))]
pub type InferenceBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferenceBackend = burn::backend::Wgpu;

pub type TrainingBackend = burn::backend::Autodiff<InferenceBackend>;
