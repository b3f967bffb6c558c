// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor code and no file
// formats here. Each use case wires data, ml and infra
// together for one command.

// The training workflow
pub mod train_use_case;

// Re-scoring a saved checkpoint
pub mod evaluate_use_case;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use anyhow::Result;

    use crate::data::ogb::dataset_info;
    use crate::domain::{
        graph::MolGraph,
        split::SplitIndices,
        traits::{GraphCollection, GraphSource},
    };

    /// Small in-memory dataset: triangle molecules whose atom
    /// features separate the two classes.
    pub struct MemorySource {
        graphs: Arc<[MolGraph]>,
        split:  SplitIndices,
    }

    impl MemorySource {
        /// `n` graphs alternating negative/positive, split 60/20/20
        pub fn balanced(n: usize) -> Self {
            let graphs: Arc<[MolGraph]> = (0..n)
                .map(|i| {
                    let y = (i % 2) as f32;
                    MolGraph::new(
                        2, 1,
                        vec![vec![y, 1.0], vec![y, 0.5], vec![1.0 - y, 0.0]],
                        vec![(0, 1), (1, 0), (1, 2), (2, 1)],
                        vec![vec![1.0], vec![1.0], vec![2.0], vec![2.0]],
                        vec![y],
                    )
                    .unwrap()
                })
                .collect();
            let n_train = n * 6 / 10;
            let n_valid = n * 2 / 10;
            let split = SplitIndices::new(
                (0..n_train).collect(),
                (n_train..n_train + n_valid).collect(),
                (n_train + n_valid..n).collect(),
            );
            Self { graphs, split }
        }

        /// Replace the test split with negatives only
        pub fn with_negative_test_split(mut self) -> Self {
            self.split.test = vec![0, 2, 4];
            self
        }
    }

    impl GraphSource for MemorySource {
        fn load(&self) -> Result<GraphCollection> {
            Ok(GraphCollection {
                info:   dataset_info("ogbg-molhiv")?,
                graphs: Arc::clone(&self.graphs),
                split:  self.split.clone(),
            })
        }
    }
}
