use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::domain::graph::MolGraph;

/// A view onto a shared graph collection.
///
/// Splits are index lists over the same `Arc<[MolGraph]>`, so
/// carving train / valid / test never copies a graph.
#[derive(Debug, Clone)]
pub struct MolDataset {
    graphs:  Arc<[MolGraph]>,
    indices: Vec<usize>,
}

impl MolDataset {
    /// Every graph, in file order
    pub fn new(graphs: Arc<[MolGraph]>) -> Self {
        let indices = (0..graphs.len()).collect();
        Self { graphs, indices }
    }

    /// The graphs at `indices` of the underlying collection.
    /// Indices past the end are dropped.
    pub fn subset(&self, indices: &[usize]) -> Self {
        let indices = indices
            .iter()
            .filter_map(|&i| self.indices.get(i).copied())
            .collect();
        Self { graphs: Arc::clone(&self.graphs), indices }
    }

    pub fn graph_count(&self) -> usize { self.indices.len() }

    pub fn positive_count(&self) -> usize {
        self.indices.iter().filter(|&&i| self.graphs[i].is_positive()).count()
    }
}

impl Dataset<MolGraph> for MolDataset {
    fn get(&self, index: usize) -> Option<MolGraph> {
        self.indices.get(index).map(|&i| self.graphs[i].clone())
    }

    fn len(&self) -> usize {
        self.indices.len()
    }
}
