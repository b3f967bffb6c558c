// ============================================================
// Layer 4 - Random Splitter
// ============================================================
// OGB datasets ship their own scaffold split. When a dataset
// directory has no split files we fall back to a random split,
// seeded so repeated runs see the same partition.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::split::SplitIndices;

/// Shuffle `0..num_graphs` and cut it into train / valid / test.
///
/// `train_fraction` and `valid_fraction` are proportions of the
/// whole set; whatever remains becomes the test split.
pub fn split_random(
    num_graphs:     usize,
    train_fraction: f64,
    valid_fraction: f64,
    seed:           u64,
) -> SplitIndices {
    let mut indices: Vec<usize> = (0..num_graphs).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_train = ((num_graphs as f64) * train_fraction).round() as usize;
    let n_train = n_train.min(num_graphs);
    let n_valid = ((num_graphs as f64) * valid_fraction).round() as usize;
    let n_valid = n_valid.min(num_graphs - n_train);

    // split_off(n) leaves [0..n) behind and returns the tail
    let mut valid = indices.split_off(n_train);
    let test = valid.split_off(n_valid);

    tracing::debug!(
        "Random split: {} train, {} valid, {} test (seed {})",
        indices.len(), valid.len(), test.len(), seed
    );

    SplitIndices::new(indices, valid, test)
}
