// ============================================================
// Layer 5 - Edge-Conditioned Convolution
// ============================================================
// Simonovsky & Komodakis (2017). Each edge carries its own
// weight matrix, produced from its edge features by a small
// "kernel network":
//
//   K(e_st)  = kernel_net(e_st)             [d_input, d_output]
//   m_st     = x_s · K(e_st)                [d_output]
//   x'_t     = relu( Σ_s m_st + root(x_t) )
//
// Messages are gathered with `select` and scattered back onto
// their target nodes with `select_assign`, which sums values
// that land on the same row.
//
// Weights are Glorot-uniform and biases start at zero.

use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

#[derive(Config, Debug)]
pub struct EccConvConfig {
    pub d_input:  usize,
    pub d_output: usize,
    pub d_edge:   usize,
    /// Hidden widths of the kernel network; empty means one Linear layer
    #[config(default = "Vec::new()")]
    pub kernel_hidden: Vec<usize>,
}

impl EccConvConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> EccConv<B> {
        let mut kernel_hidden = Vec::with_capacity(self.kernel_hidden.len());
        let mut width = self.d_edge;
        for &h in &self.kernel_hidden {
            kernel_hidden.push(glorot_linear(width, h, device));
            width = h;
        }
        let kernel_out = glorot_linear(width, self.d_input * self.d_output, device);
        let root = glorot_linear(self.d_input, self.d_output, device);

        EccConv {
            kernel_hidden,
            kernel_out,
            root,
            d_input:  self.d_input,
            d_output: self.d_output,
        }
    }
}

/// `Linear` with Glorot-uniform weights and a zero bias.
///
/// `LinearConfig::with_initializer` applies the initializer to the
/// bias too, so the bias is replaced after init.
pub(crate) fn glorot_linear<B: Backend>(
    d_input:  usize,
    d_output: usize,
    device:   &B::Device,
) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output)
        .with_initializer(Initializer::XavierUniform { gain: 1.0 })
        .init(device);
    linear.bias = Some(Param::from_tensor(Tensor::zeros([d_output], device)));
    linear
}

#[derive(Module, Debug)]
pub struct EccConv<B: Backend> {
    pub kernel_hidden: Vec<Linear<B>>,
    pub kernel_out:    Linear<B>,
    pub root:          Linear<B>,
    pub d_input:       usize,
    pub d_output:      usize,
}

impl<B: Backend> EccConv<B> {
    /// nodes [N, d_input], edges [M, d_edge], sources/targets [M] → [N, d_output]
    pub fn forward(
        &self,
        nodes:   Tensor<B, 2>,
        edges:   Tensor<B, 2>,
        sources: Tensor<B, 1, Int>,
        targets: Tensor<B, 1, Int>,
    ) -> Tensor<B, 2> {
        let [num_nodes, _] = nodes.dims();
        let [num_edges]    = sources.dims();

        let self_term = self.root.forward(nodes.clone());
        if num_edges == 0 {
            return relu(self_term);
        }

        // One [d_input, d_output] matrix per edge
        let mut k = edges;
        for layer in &self.kernel_hidden {
            k = relu(layer.forward(k));
        }
        let kernels = self.kernel_out
            .forward(k)
            .reshape([num_edges, self.d_input, self.d_output]);

        // [M, 1, d_input] x [M, d_input, d_output] → [M, 1, d_output]
        let messages = nodes
            .select(0, sources)
            .reshape([num_edges, 1, self.d_input])
            .matmul(kernels)
            .reshape([num_edges, self.d_output]);

        let aggregated = Tensor::<B, 2>::zeros([num_nodes, self.d_output], &self_term.device())
            .select_assign(0, targets, messages);

        relu(aggregated + self_term)
    }
}
