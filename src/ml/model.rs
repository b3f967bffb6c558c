// ============================================================
// Layer 5 - Molecule GNN
// ============================================================
//   nodes ─► ECC(hidden, relu) ─► ... ─► ECC(hidden, relu)
//         ─► global sum pool ─► Linear(hidden → tasks) ─► logits
//
// The head emits logits; sigmoid is applied by `predict` and
// folded into the loss during training.

use burn::{
    nn::{loss::BinaryCrossEntropyLossConfig, Linear},
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::data::batcher::DisjointBatch;
use crate::ml::ecc::{glorot_linear, EccConv, EccConvConfig};
use crate::ml::pool::global_sum_pool;

#[derive(Config, Debug)]
pub struct MolGnnConfig {
    pub node_dim:  usize,
    pub edge_dim:  usize,
    pub num_tasks: usize,
    #[config(default = 32)]
    pub hidden: usize,
    #[config(default = 2)]
    pub num_layers: usize,
    #[config(default = "Vec::new()")]
    pub kernel_hidden: Vec<usize>,
}

impl MolGnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MolGnn<B> {
        let convs = (0..self.num_layers)
            .map(|i| {
                let d_input = if i == 0 { self.node_dim } else { self.hidden };
                EccConvConfig::new(d_input, self.hidden, self.edge_dim)
                    .with_kernel_hidden(self.kernel_hidden.clone())
                    .init(device)
            })
            .collect();
        let d_pooled = if self.num_layers == 0 { self.node_dim } else { self.hidden };
        let head = glorot_linear(d_pooled, self.num_tasks, device);
        MolGnn { convs, head }
    }
}

#[derive(Module, Debug)]
pub struct MolGnn<B: Backend> {
    pub convs: Vec<EccConv<B>>,
    pub head:  Linear<B>,
}

impl<B: Backend> MolGnn<B> {
    /// One logit row per graph: [num_graphs, num_tasks]
    pub fn forward(&self, batch: &DisjointBatch<B>) -> Tensor<B, 2> {
        let mut x = batch.nodes.clone();
        for conv in &self.convs {
            x = conv.forward(
                x,
                batch.edges.clone(),
                batch.sources.clone(),
                batch.targets.clone(),
            );
        }
        let pooled = global_sum_pool(x, batch.graph_index.clone(), batch.num_graphs);
        self.head.forward(pooled)
    }

    /// Probabilities in [0, 1]
    pub fn predict(&self, batch: &DisjointBatch<B>) -> Tensor<B, 2> {
        sigmoid(self.forward(batch))
    }

    /// Mean binary cross-entropy over every (graph, task) pair
    pub fn forward_loss(&self, batch: &DisjointBatch<B>) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(batch);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let loss = bce.forward(logits.clone(), batch.labels.clone());
        (loss, logits)
    }
}
