// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from OGB csv files to tensor batches:
//
//   OGB raw csv directory
//       │
//       ▼
//   OgbLoader         → parses graphs, labels and the split
//       │
//       ▼
//   MolDataset        → implements Burn's Dataset trait
//       │
//       ▼
//   DisjointBatcher   → merges graphs into one disjoint union
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop

/// Reads OGB molecular datasets from their csv layout
pub mod ogb;

/// Implements Burn's Dataset trait over a shared graph collection
pub mod dataset;

/// Implements Burn's Batcher trait for disjoint-mode batches
pub mod batcher;

/// Seeded random split used when a dataset ships none
pub mod splitter;
