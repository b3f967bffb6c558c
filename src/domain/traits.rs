// ============================================================
// Layer 3 - Core Traits
// ============================================================
// The application layer loads graphs through GraphSource and
// never learns where they came from.
//
// Implementations:
//   - OgbLoader → reads an OGB raw csv directory

use std::sync::Arc;

use anyhow::Result;

use crate::domain::graph::MolGraph;
use crate::domain::split::SplitIndices;

/// Static facts about a benchmark dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub name:             &'static str,
    pub num_tasks:        usize,
    pub split:            &'static str,
    pub add_inverse_edge: bool,
}

/// Everything a source hands back: the graphs and how to split them.
#[derive(Debug, Clone)]
pub struct GraphCollection {
    pub info:   DatasetInfo,
    pub graphs: Arc<[MolGraph]>,
    pub split:  SplitIndices,
}

impl GraphCollection {
    /// Feature widths shared by every graph, or (0, 0) when empty.
    pub fn feature_dims(&self) -> (usize, usize) {
        self.graphs
            .first()
            .map(|g| (g.node_dim(), g.edge_dim()))
            .unwrap_or((0, 0))
    }
}

/// Any component that can produce a labelled graph collection.
pub trait GraphSource {
    fn load(&self) -> Result<GraphCollection>;
}
