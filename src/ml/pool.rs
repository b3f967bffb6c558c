use burn::prelude::*;

/// Sum node embeddings per graph: x [N, F], graph_index [N] → [num_graphs, F].
///
/// Graphs without nodes get an all-zero row.
pub fn global_sum_pool<B: Backend>(
    nodes:       Tensor<B, 2>,
    graph_index: Tensor<B, 1, Int>,
    num_graphs:  usize,
) -> Tensor<B, 2> {
    let [num_nodes, features] = nodes.dims();
    let pooled = Tensor::<B, 2>::zeros([num_graphs, features], &nodes.device());
    if num_nodes == 0 {
        return pooled;
    }
    pooled.select_assign(0, graph_index, nodes)
}
