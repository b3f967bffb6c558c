// ============================================================
// Layer 2 - EvaluateUseCase
// ============================================================
// Rebuilds the model saved by `train` and scores it on one
// split of the dataset it was trained on:
//
//   Step 1: Read train_config.json and model_config.json
//   Step 2: Reload the dataset with the same seed
//   Step 3: Load the checkpoint the run selected (last or best)
//   Step 4: Evaluate the chosen split

use std::path::Path;

use anyhow::{bail, Result};
use burn::prelude::Backend;

use crate::data::{dataset::MolDataset, ogb::OgbLoader};
use crate::domain::{split::SplitKind, traits::GraphSource};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    evaluator::{evaluate_model, Evaluation, OgbEvaluator},
    InferenceBackend,
};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    split:          SplitKind,
    batch_size:     usize,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, split: SplitKind, batch_size: usize) -> Self {
        Self { checkpoint_dir: checkpoint_dir.into(), split, batch_size }
    }

    pub fn execute(&self) -> Result<Evaluation> {
        let ckpt = self.open_checkpoints()?;
        let cfg  = ckpt.load_config()?;
        let source = OgbLoader::new(&cfg.root, &cfg.dataset)?.with_seed(cfg.seed);
        self.execute_with::<InferenceBackend>(&source, &Default::default())
    }

    pub fn execute_with<B: Backend>(
        &self,
        source: &dyn GraphSource,
        device: &B::Device,
    ) -> Result<Evaluation> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }

        // ── Step 1: Configs ───────────────────────────────────────────────────
        let ckpt         = self.open_checkpoints()?;
        let train_config = ckpt.load_config()?;
        let model_config = ckpt.load_model_config()?;

        // ── Step 2: Data ──────────────────────────────────────────────────────
        let collection = source.load()?;
        collection.split.validate(collection.graphs.len())?;
        let (node_dim, edge_dim) = collection.feature_dims();
        if node_dim != model_config.node_dim || edge_dim != model_config.edge_dim {
            bail!(
                "Checkpoint expects {}x{} node/edge features but '{}' has {}x{}",
                model_config.node_dim, model_config.edge_dim,
                collection.info.name, node_dim, edge_dim
            );
        }
        let dataset = MolDataset::new(collection.graphs.clone())
            .subset(collection.split.get(self.split));

        // ── Step 3: Model ─────────────────────────────────────────────────────
        let model = ckpt.load_model(model_config.init::<B>(device), train_config.select, device)?;

        // ── Step 4: Score ─────────────────────────────────────────────────────
        let evaluator = OgbEvaluator::new(collection.info.name, collection.info.num_tasks);
        let result = evaluate_model(&model, &evaluator, dataset, self.batch_size, device)?;
        tracing::info!("Evaluated {} graphs from the {} split", result.num_graphs, self.split);

        match result.rocauc {
            Some(score) => println!(
                "{} loss: {:.4}. ROC-AUC: {:.2}", self.split, result.loss, score
            ),
            None => println!(
                "{} loss: {:.4}. ROC-AUC: undefined (single class)", self.split, result.loss
            ),
        }
        Ok(result)
    }

    /// `CheckpointManager::new` creates its directory, which evaluation must not do.
    fn open_checkpoints(&self) -> Result<CheckpointManager> {
        if !Path::new(&self.checkpoint_dir).is_dir() {
            bail!(
                "Checkpoint directory '{}' does not exist. Run 'train' first.",
                self.checkpoint_dir
            );
        }
        CheckpointManager::new(&self.checkpoint_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::application::{
        fixtures::MemorySource,
        train_use_case::{TrainConfig, TrainUseCase},
    };

    #[test]
    fn test_scores_saved_checkpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_string_lossy().into_owned();
        let source = MemorySource::balanced(20);

        let cfg = TrainConfig {
            checkpoint_dir: dir.clone(),
            epochs:         1,
            batch_size:     4,
            hidden:         8,
            num_workers:    0,
            ..TrainConfig::default()
        };
        TrainUseCase::new(cfg)
            .execute_with::<Autodiff<NdArray>>(&source, &Default::default())
            .unwrap();

        let result = EvaluateUseCase::new(dir, SplitKind::Valid, 8)
            .execute_with::<NdArray>(&source, &Default::default())
            .unwrap();
        assert_eq!(result.num_graphs, 4);
        assert!(result.loss.is_finite());
        assert!(result.rocauc.is_some());
    }

    #[test]
    fn test_empty_checkpoint_dir_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = EvaluateUseCase::new(tmp.path().to_string_lossy(), SplitKind::Test, 8)
            .execute_with::<NdArray>(&MemorySource::balanced(10), &Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("config"));
    }

    #[test]
    fn test_missing_checkpoint_dir_is_not_created() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("never-trained");

        let err = EvaluateUseCase::new(missing.to_string_lossy(), SplitKind::Test, 8)
            .execute()
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(!missing.exists());
    }
}
