// ============================================================
// Layer 4 - OGB Dataset Loader
// ============================================================
// Reads the csv layout that OGB ships its molecular graph
// property prediction datasets in:
//
//   <root>/ogbg_molhiv/
//     raw/num-node-list.csv.gz   one node count per graph
//     raw/num-edge-list.csv.gz   one edge count per graph
//     raw/edge.csv.gz            src,dst (graph-local indices)
//     raw/node-feat.csv.gz       9 atom features per node
//     raw/edge-feat.csv.gz       3 bond features per edge
//     raw/graph-label.csv.gz     one column per task
//     split/scaffold/{train,valid,test}.csv.gz
//
// All files are header-less. Plain .csv is accepted when no
// .csv.gz exists. Rows of the node/edge files are concatenated
// across graphs; the count lists say where each graph ends.
//
// Molecule files store each bond once. With add_inverse_edge
// every bond (u, v) is expanded to (u, v), (v, u) and its
// feature row duplicated, so messages flow both ways.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;

use crate::data::splitter::split_random;
use crate::domain::graph::MolGraph;
use crate::domain::split::SplitIndices;
use crate::domain::traits::{DatasetInfo, GraphCollection, GraphSource};

const DOWNLOAD_BASE: &str = "http://snap.stanford.edu/ogb/data/graphproppred/csv_mol_download";

/// Binary classification datasets with every label observed.
const DATASETS: [DatasetInfo; 4] = [
    DatasetInfo { name: "ogbg-molhiv",     num_tasks: 1, split: "scaffold", add_inverse_edge: true },
    DatasetInfo { name: "ogbg-molbace",    num_tasks: 1, split: "scaffold", add_inverse_edge: true },
    DatasetInfo { name: "ogbg-molbbbp",    num_tasks: 1, split: "scaffold", add_inverse_edge: true },
    DatasetInfo { name: "ogbg-molclintox", num_tasks: 2, split: "scaffold", add_inverse_edge: true },
];

/// Look up a dataset by its OGB name.
pub fn dataset_info(name: &str) -> Result<DatasetInfo> {
    DATASETS
        .iter()
        .find(|d| d.name == name)
        .cloned()
        .ok_or_else(|| {
            let known: Vec<&str> = DATASETS.iter().map(|d| d.name).collect();
            anyhow!("Unknown dataset '{}'. Supported: {}", name, known.join(", "))
        })
}

/// Loads one OGB molecular dataset from disk.
pub struct OgbLoader {
    root: PathBuf,
    info: DatasetInfo,
    /// Seed for the fallback random split
    seed: u64,
}

impl OgbLoader {
    pub fn new(root: impl Into<PathBuf>, name: &str) -> Result<Self> {
        Ok(Self { root: root.into(), info: dataset_info(name)?, seed: 42 })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// OGB stores `ogbg-molhiv` under `ogbg_molhiv`
    pub fn dataset_dir(&self) -> PathBuf {
        self.root.join(self.info.name.replace('-', "_"))
    }

    fn load_graphs(&self, raw: &Path) -> Result<Vec<MolGraph>> {
        let node_counts: Vec<usize> = read_column(raw, "num-node-list")?;
        let edge_counts: Vec<usize> = read_column(raw, "num-edge-list")?;
        let edge_index:  Vec<Vec<usize>> = read_table(raw, "edge")?;
        let node_feat:   Vec<Vec<f32>> = read_table(raw, "node-feat")?;
        let edge_feat:   Vec<Vec<f32>> = read_table(raw, "edge-feat")?;
        let labels:      Vec<Vec<f32>> = read_table(raw, "graph-label")?;

        let num_graphs = node_counts.len();
        if edge_counts.len() != num_graphs || labels.len() != num_graphs {
            bail!(
                "Graph count mismatch: {} node counts, {} edge counts, {} labels",
                num_graphs, edge_counts.len(), labels.len()
            );
        }
        let total_nodes: usize = node_counts.iter().sum();
        let total_edges: usize = edge_counts.iter().sum();
        if node_feat.len() != total_nodes {
            bail!("Expected {} node feature rows, found {}", total_nodes, node_feat.len());
        }
        if edge_index.len() != total_edges || edge_feat.len() != total_edges {
            bail!(
                "Expected {} edges, found {} edge rows and {} edge feature rows",
                total_edges, edge_index.len(), edge_feat.len()
            );
        }

        let node_dim = node_feat.first().map_or(0, Vec::len);
        let edge_dim = edge_feat.first().map_or(0, Vec::len);

        let mut node_rows = node_feat.into_iter();
        let mut edge_rows = edge_index.into_iter().zip(edge_feat);
        let mut graphs = Vec::with_capacity(num_graphs);

        for (g, ((&n, &m), y)) in node_counts.iter().zip(&edge_counts).zip(labels).enumerate() {
            let nodes: Vec<Vec<f32>> = node_rows.by_ref().take(n).collect();

            let fanout = if self.info.add_inverse_edge { 2 } else { 1 };
            let mut edges    = Vec::with_capacity(m * fanout);
            let mut features = Vec::with_capacity(m * fanout);
            for (pair, feat) in edge_rows.by_ref().take(m) {
                let &[u, v] = pair.as_slice() else {
                    bail!("Graph {}: edge row has {} columns, expected 2", g, pair.len());
                };
                edges.push((u, v));
                if self.info.add_inverse_edge {
                    edges.push((v, u));
                    features.push(feat.clone());
                }
                features.push(feat);
            }

            let graph = MolGraph::new(node_dim, edge_dim, nodes, edges, features, y)
                .with_context(|| format!("Invalid graph {g}"))?;
            if graph.num_tasks() != self.info.num_tasks {
                bail!(
                    "Graph {} has {} labels, {} expects {}",
                    g, graph.num_tasks(), self.info.name, self.info.num_tasks
                );
            }
            graphs.push(graph);
        }

        Ok(graphs)
    }

    fn load_split(&self, dir: &Path, num_graphs: usize) -> Result<SplitIndices> {
        let split_dir = dir.join("split").join(self.info.split);
        if !split_dir.exists() {
            tracing::warn!(
                "No split directory at '{}'; using a random 80/10/10 split",
                split_dir.display()
            );
            return Ok(split_random(num_graphs, 0.8, 0.1, self.seed));
        }
        let split = SplitIndices::new(
            read_column(&split_dir, "train")?,
            read_column(&split_dir, "valid")?,
            read_column(&split_dir, "test")?,
        );
        split.validate(num_graphs)?;
        Ok(split)
    }
}

impl GraphSource for OgbLoader {
    fn load(&self) -> Result<GraphCollection> {
        let dir = self.dataset_dir();
        if !dir.exists() {
            let short = self.info.name.trim_start_matches("ogbg-mol");
            bail!(
                "Dataset directory '{}' does not exist. Download {}/{}.zip and extract it as '{}'",
                dir.display(), DOWNLOAD_BASE, short, dir.display()
            );
        }

        tracing::info!("Loading {} from '{}'", self.info.name, dir.display());
        let graphs = self.load_graphs(&dir.join("raw"))?;
        let split  = self.load_split(&dir, graphs.len())?;

        tracing::info!(
            "Loaded {} graphs ({} train, {} valid, {} test)",
            graphs.len(), split.train.len(), split.valid.len(), split.test.len()
        );

        Ok(GraphCollection {
            info:   self.info.clone(),
            graphs: Arc::from(graphs),
            split,
        })
    }
}

/// Open `<stem>.csv.gz`, or `<stem>.csv` when the gzip is absent.
fn open_table(dir: &Path, stem: &str) -> Result<csv::Reader<Box<dyn Read>>> {
    let gz    = dir.join(format!("{stem}.csv.gz"));
    let plain = dir.join(format!("{stem}.csv"));

    let reader: Box<dyn Read> = if gz.exists() {
        let f = File::open(&gz).with_context(|| format!("Cannot open '{}'", gz.display()))?;
        Box::new(GzDecoder::new(BufReader::new(f)))
    } else {
        let f = File::open(&plain)
            .with_context(|| format!("Cannot open '{}' or '{}'", gz.display(), plain.display()))?;
        Box::new(BufReader::new(f))
    };

    Ok(csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader))
}

/// Read every row of a header-less numeric csv file.
fn read_table<T>(dir: &Path, stem: &str) -> Result<Vec<Vec<T>>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let mut rdr  = open_table(dir, stem)?;
    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("{stem}: malformed row {}", line + 1))?;
        let row = record
            .iter()
            .map(|field| {
                field.parse::<T>().map_err(|e| {
                    anyhow!("{}: row {}: cannot parse '{}': {}", stem, line + 1, field, e)
                })
            })
            .collect::<Result<Vec<T>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read a single-column csv file.
fn read_column<T>(dir: &Path, stem: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    read_table::<T>(dir, stem)?
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            if row.len() != 1 {
                bail!("{}: row {} has {} columns, expected 1", stem, i + 1, row.len());
            }
            Ok(row.remove(0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::{fs, io::Write};

    fn write_plain(dir: &Path, stem: &str, body: &str) {
        fs::write(dir.join(format!("{stem}.csv")), body).unwrap();
    }

    fn write_gz(dir: &Path, stem: &str, body: &str) {
        let f = File::create(dir.join(format!("{stem}.csv.gz"))).unwrap();
        let mut enc = GzEncoder::new(f, Compression::default());
        enc.write_all(body.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    /// Two molecules: a 3-atom chain with 2 bonds and a lone atom.
    fn fixture(root: &Path, with_split: bool) {
        let raw = root.join("ogbg_molhiv").join("raw");
        fs::create_dir_all(&raw).unwrap();
        write_gz(&raw, "num-node-list", "3\n1\n");
        write_gz(&raw, "num-edge-list", "2\n0\n");
        write_plain(&raw, "edge", "0,1\n1,2\n");
        write_gz(&raw, "node-feat", "6,0\n8,1\n6,0\n7,2\n");
        write_plain(&raw, "edge-feat", "1,0\n2,1\n");
        write_gz(&raw, "graph-label", "1\n0\n");

        if with_split {
            let split = root.join("ogbg_molhiv").join("split").join("scaffold");
            fs::create_dir_all(&split).unwrap();
            write_gz(&split, "train", "1\n");
            write_gz(&split, "valid", "0\n");
            write_gz(&split, "test", "");
        }
    }

    #[test]
    fn test_loads_graphs_with_inverse_edges() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path(), true);

        let coll = OgbLoader::new(tmp.path(), "ogbg-molhiv").unwrap().load().unwrap();
        assert_eq!(coll.graphs.len(), 2);
        assert_eq!(coll.feature_dims(), (2, 2));

        let chain = &coll.graphs[0];
        assert_eq!(chain.num_nodes(), 3);
        assert_eq!(chain.edges(), &[(0, 1), (1, 0), (1, 2), (2, 1)]);
        assert_eq!(chain.edge_features(), &[1.0, 0.0, 1.0, 0.0, 2.0, 1.0, 2.0, 1.0]);
        assert_eq!(chain.labels(), &[1.0]);

        let lone = &coll.graphs[1];
        assert_eq!(lone.num_nodes(), 1);
        assert_eq!(lone.num_edges(), 0);
        assert_eq!(lone.node_features(), &[7.0, 2.0]);

        assert_eq!(coll.split, SplitIndices::new(vec![1], vec![0], vec![]));
    }

    #[test]
    fn test_random_split_when_split_dir_missing() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path(), false);

        let coll = OgbLoader::new(tmp.path(), "ogbg-molhiv").unwrap().with_seed(9).load().unwrap();
        assert_eq!(coll.split.len_total(), 2);
    }

    #[test]
    fn test_unknown_dataset_is_rejected() {
        let err = OgbLoader::new("dataset", "ogbg-molfoo").err().unwrap().to_string();
        assert!(err.contains("ogbg-molhiv"));
    }

    #[test]
    fn test_missing_directory_names_download_url() {
        let tmp = tempfile::tempdir().unwrap();
        let err = OgbLoader::new(tmp.path(), "ogbg-molhiv").unwrap().load().unwrap_err();
        assert!(err.to_string().contains("csv_mol_download/hiv.zip"));
    }

    #[test]
    fn test_count_mismatch_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path(), true);
        let raw = tmp.path().join("ogbg_molhiv").join("raw");
        write_gz(&raw, "num-node-list", "3\n2\n");

        let err = OgbLoader::new(tmp.path(), "ogbg-molhiv").unwrap().load().unwrap_err();
        assert!(err.to_string().contains("node feature rows"));
    }

    #[test]
    fn test_nan_label_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path(), true);
        let raw = tmp.path().join("ogbg_molhiv").join("raw");
        write_gz(&raw, "graph-label", "nan\n0\n");

        assert!(OgbLoader::new(tmp.path(), "ogbg-molhiv").unwrap().load().is_err());
    }

    #[test]
    fn test_split_out_of_range_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path(), true);
        let split = tmp.path().join("ogbg_molhiv").join("split").join("scaffold");
        write_gz(&split, "test", "5\n");

        assert!(OgbLoader::new(tmp.path(), "ogbg-molhiv").unwrap().load().is_err());
    }
}
