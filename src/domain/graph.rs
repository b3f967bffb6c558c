// ============================================================
// Layer 3 - MolGraph Domain Type
// ============================================================
// One molecule, stored the way a message-passing network reads it:
//
//   node_features  [num_nodes, node_dim]   row-major, one row per atom
//   edges          [num_edges] of (src, dst), local node indices
//   edge_features  [num_edges, edge_dim]   row i belongs to edges[i]
//   labels         [num_tasks]             0.0 or 1.0 per task
//
// Feature matrices are flattened so batching is a plain extend.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolGraph {
    num_nodes:     usize,
    node_dim:      usize,
    edge_dim:      usize,
    node_features: Vec<f32>,
    edges:         Vec<(usize, usize)>,
    edge_features: Vec<f32>,
    labels:        Vec<f32>,
}

impl MolGraph {
    /// Build a graph from per-row feature vectors.
    ///
    /// Every node row must have `node_dim` columns, every edge row
    /// `edge_dim` columns, there must be one edge row per edge, every
    /// endpoint must name an existing node, and labels must be 0 or 1.
    pub fn new(
        node_dim:      usize,
        edge_dim:      usize,
        node_rows:     Vec<Vec<f32>>,
        edges:         Vec<(usize, usize)>,
        edge_rows:     Vec<Vec<f32>>,
        labels:        Vec<f32>,
    ) -> Result<Self> {
        let num_nodes = node_rows.len();

        if let Some(bad) = node_rows.iter().position(|r| r.len() != node_dim) {
            bail!(
                "node {} has {} features, expected {}",
                bad, node_rows[bad].len(), node_dim
            );
        }
        if edge_rows.len() != edges.len() {
            bail!(
                "{} edges but {} edge feature rows",
                edges.len(), edge_rows.len()
            );
        }
        if let Some(bad) = edge_rows.iter().position(|r| r.len() != edge_dim) {
            bail!(
                "edge {} has {} features, expected {}",
                bad, edge_rows[bad].len(), edge_dim
            );
        }
        if let Some(&(s, d)) = edges.iter().find(|(s, d)| *s >= num_nodes || *d >= num_nodes) {
            bail!("edge ({s}, {d}) points outside a graph of {num_nodes} nodes");
        }
        if labels.is_empty() {
            bail!("graph has no labels");
        }
        if let Some(l) = labels.iter().find(|l| **l != 0.0 && **l != 1.0) {
            bail!("label {l} is not binary");
        }

        Ok(Self {
            num_nodes,
            node_dim,
            edge_dim,
            node_features: node_rows.into_iter().flatten().collect(),
            edges,
            edge_features: edge_rows.into_iter().flatten().collect(),
            labels,
        })
    }

    pub fn num_nodes(&self) -> usize { self.num_nodes }

    pub fn num_edges(&self) -> usize { self.edges.len() }

    pub fn node_dim(&self) -> usize { self.node_dim }

    pub fn edge_dim(&self) -> usize { self.edge_dim }

    pub fn num_tasks(&self) -> usize { self.labels.len() }

    /// Flattened `[num_nodes, node_dim]` node feature matrix
    pub fn node_features(&self) -> &[f32] { &self.node_features }

    pub fn edges(&self) -> &[(usize, usize)] { &self.edges }

    /// Flattened `[num_edges, edge_dim]` edge feature matrix
    pub fn edge_features(&self) -> &[f32] { &self.edge_features }

    pub fn labels(&self) -> &[f32] { &self.labels }

    /// True if any task is labelled positive
    pub fn is_positive(&self) -> bool {
        self.labels.iter().any(|&l| l == 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Result<MolGraph> {
        MolGraph::new(
            2, 1,
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            vec![(0, 1), (1, 2), (2, 0)],
            vec![vec![1.0], vec![2.0], vec![3.0]],
            vec![1.0],
        )
    }

    #[test]
    fn test_flattens_features() {
        let g = triangle().unwrap();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.node_features(), &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(g.edge_features(), &[1.0, 2.0, 3.0]);
        assert!(g.is_positive());
    }

    #[test]
    fn test_rejects_edge_out_of_range() {
        let err = MolGraph::new(
            1, 1,
            vec![vec![0.0], vec![0.0]],
            vec![(0, 2)],
            vec![vec![0.0]],
            vec![0.0],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = MolGraph::new(
            2, 1,
            vec![vec![0.0, 1.0], vec![0.0]],
            vec![],
            vec![],
            vec![0.0],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_missing_edge_features() {
        let err = MolGraph::new(1, 1, vec![vec![0.0]; 2], vec![(0, 1)], vec![], vec![0.0]);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_non_binary_label() {
        let err = MolGraph::new(1, 0, vec![vec![0.0]], vec![], vec![], vec![f32::NAN]);
        assert!(err.is_err());
        let err = MolGraph::new(1, 0, vec![vec![0.0]], vec![], vec![], vec![0.5]);
        assert!(err.is_err());
    }

    #[test]
    fn test_single_atom_without_bonds_is_valid() {
        let g = MolGraph::new(3, 2, vec![vec![6.0, 0.0, 1.0]], vec![], vec![], vec![0.0]).unwrap();
        assert_eq!(g.num_edges(), 0);
        assert!(g.edge_features().is_empty());
        assert!(!g.is_positive());
    }
}
