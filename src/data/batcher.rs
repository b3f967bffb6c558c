// ============================================================
// Layer 4 - Disjoint Batcher
// ============================================================
// Implements Burn's Batcher trait to merge a Vec<MolGraph> into
// one large disconnected graph ("disjoint mode").
//
// Molecules have different atom counts, so they cannot be
// stacked along a batch dimension. Instead:
//
//   nodes        [N, F]  every graph's node rows, one after another
//   edges        [M, S]  every graph's edge rows, one after another
//   sources      [M]     edge source node, offset into the union
//   targets      [M]     edge target node, offset into the union
//   graph_index  [N]     which graph each node belongs to
//   labels       [G, T]  one label row per graph
//
// The adjacency of the union is block-diagonal: an edge of graph
// g only touches the node range that g occupies.
//
// Example, graphs of 2 and 3 nodes:
//   graph 0 edge (0, 1) → (0, 1)
//   graph 1 edge (0, 2) → (2, 4)
//   graph_index = [0, 0, 1, 1, 1]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::graph::MolGraph;

/// A batch of molecules ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct DisjointBatch<B: Backend> {
    pub nodes:       Tensor<B, 2>,
    pub edges:       Tensor<B, 2>,
    pub sources:     Tensor<B, 1, Int>,
    pub targets:     Tensor<B, 1, Int>,
    pub graph_index: Tensor<B, 1, Int>,

    /// Ground truth, shape [num_graphs, num_tasks]
    pub labels: Tensor<B, 2, Int>,

    /// Host copy of `labels`, row-major, kept for metric computation
    pub label_values: Vec<f32>,

    pub num_graphs: usize,
    pub num_edges:  usize,
}

#[derive(Clone, Debug)]
pub struct DisjointBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> DisjointBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<MolGraph, DisjointBatch<B>> for DisjointBatcher<B> {
    fn batch(&self, items: Vec<MolGraph>) -> DisjointBatch<B> {
        let num_graphs = items.len();
        let node_dim   = items.first().map_or(0, MolGraph::node_dim);
        let edge_dim   = items.first().map_or(0, MolGraph::edge_dim);
        let num_tasks  = items.first().map_or(0, MolGraph::num_tasks);

        let total_nodes: usize = items.iter().map(MolGraph::num_nodes).sum();
        let total_edges: usize = items.iter().map(MolGraph::num_edges).sum();

        let mut node_feat   = Vec::with_capacity(total_nodes * node_dim);
        let mut edge_feat   = Vec::with_capacity(total_edges * edge_dim);
        let mut sources     = Vec::with_capacity(total_edges);
        let mut targets     = Vec::with_capacity(total_edges);
        let mut graph_index = Vec::with_capacity(total_nodes);
        let mut labels      = Vec::with_capacity(num_graphs * num_tasks);

        // Offset of the current graph's first node in the union
        let mut offset = 0usize;
        for (g, graph) in items.iter().enumerate() {
            node_feat.extend_from_slice(graph.node_features());
            edge_feat.extend_from_slice(graph.edge_features());
            for &(s, t) in graph.edges() {
                sources.push((s + offset) as i32);
                targets.push((t + offset) as i32);
            }
            graph_index.extend(std::iter::repeat(g as i32).take(graph.num_nodes()));
            labels.extend_from_slice(graph.labels());
            offset += graph.num_nodes();
        }

        let label_ints: Vec<i32> = labels.iter().map(|&y| y as i32).collect();

        DisjointBatch {
            nodes: Tensor::<B, 1>::from_floats(node_feat.as_slice(), &self.device)
                .reshape([total_nodes, node_dim]),
            edges: Tensor::<B, 1>::from_floats(edge_feat.as_slice(), &self.device)
                .reshape([total_edges, edge_dim]),
            sources:     Tensor::<B, 1, Int>::from_ints(sources.as_slice(), &self.device),
            targets:     Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device),
            graph_index: Tensor::<B, 1, Int>::from_ints(graph_index.as_slice(), &self.device),
            labels: Tensor::<B, 1, Int>::from_ints(label_ints.as_slice(), &self.device)
                .reshape([num_graphs, num_tasks]),
            label_values: labels,
            num_graphs,
            num_edges: total_edges,
        }
    }
}
