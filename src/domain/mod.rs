// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types describing what the system works on:
// labelled molecular graphs, dataset splits, and the trait
// every graph source implements.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// A labelled molecule as a graph
pub mod graph;

// Train / validation / test index lists
pub mod split;

// Core abstractions (traits) that other layers implement
pub mod traits;
