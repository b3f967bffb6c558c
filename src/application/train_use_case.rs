// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load graphs and the split     (Layer 4 - data)
//   Step 3: Carve train / valid / test    (Layer 4 - data)
//   Step 4: Save both configs             (Layer 6 - infra)
//   Step 5: Train with validation         (Layer 5 - ml)
//   Step 6: Score the test split          (Layer 5 - ml)

use anyhow::{bail, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::data::{dataset::MolDataset, ogb::OgbLoader};
use crate::domain::traits::GraphSource;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    evaluator::{evaluate_model, OgbEvaluator},
    model::MolGnnConfig,
    trainer::{run_training, TrainingSetup},
    TrainingBackend,
};

/// Which epoch's weights are scored on the test split and
/// reloaded by `evaluate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSelection {
    /// Weights after the final epoch
    #[default]
    Last,
    /// Weights of the best validation epoch
    Best,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved next to the checkpoints so `evaluate` can rebuild the
// same dataset and split later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset:        String,
    pub root:           String,
    pub checkpoint_dir: String,
    pub lr:             f64,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub hidden:         usize,
    pub num_layers:     usize,
    pub seed:           u64,
    pub num_workers:    usize,
    #[serde(default)]
    pub select:         ModelSelection,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset:        "ogbg-molhiv".to_string(),
            root:           "dataset".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            lr:             1e-3,
            epochs:         10,
            batch_size:     32,
            hidden:         32,
            num_layers:     2,
            seed:           42,
            num_workers:    1,
            select:         ModelSelection::Last,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if !self.lr.is_finite() || self.lr <= 0.0 {
            bail!("learning rate must be a positive number, got {}", self.lr);
        }
        if self.hidden == 0 || self.num_layers == 0 {
            bail!("hidden and num_layers must both be at least 1");
        }
        Ok(())
    }
}

/// Final scores on the test split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainReport {
    pub test_loss:   f64,
    pub test_rocauc: f64,
    pub best_epoch:  usize,
    /// Epoch whose weights produced the test scores
    pub selected_epoch: usize,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the configured OGB dataset with the default backend.
    pub fn execute(&self) -> Result<TrainReport> {
        self.config.validate()?;
        let source = OgbLoader::new(&self.config.root, &self.config.dataset)?
            .with_seed(self.config.seed);
        self.execute_with::<TrainingBackend>(&source, &Default::default())
    }

    pub fn execute_with<B: AutodiffBackend>(
        &self,
        source: &dyn GraphSource,
        device: &B::Device,
    ) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 2: Load graphs ───────────────────────────────────────────────
        let collection = source.load()?;
        if collection.graphs.is_empty() {
            bail!("Dataset '{}' contains no graphs", collection.info.name);
        }
        collection.split.validate(collection.graphs.len())?;
        if collection.split.len_total() != collection.graphs.len() {
            tracing::warn!(
                "Split covers {} of {} graphs",
                collection.split.len_total(), collection.graphs.len()
            );
        }

        // ── Step 3: Carve the splits ──────────────────────────────────────────
        let full  = MolDataset::new(collection.graphs.clone());
        let train = full.subset(&collection.split.train);
        let valid = full.subset(&collection.split.valid);
        let test  = full.subset(&collection.split.test);
        tracing::info!(
            "Split: {} train ({} positive), {} valid, {} test",
            train.graph_count(), train.positive_count(),
            valid.graph_count(), test.graph_count(),
        );

        // ── Step 4: Persist configs ───────────────────────────────────────────
        let (node_dim, edge_dim) = collection.feature_dims();
        let model_config = MolGnnConfig::new(node_dim, edge_dim, collection.info.num_tasks)
            .with_hidden(cfg.hidden)
            .with_num_layers(cfg.num_layers);

        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir)?;
        checkpoints.save_config(cfg)?;
        checkpoints.save_model_config(&model_config)?;
        let metrics   = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let evaluator = OgbEvaluator::new(collection.info.name, collection.info.num_tasks);

        // ── Step 5: Train ─────────────────────────────────────────────────────
        let setup = TrainingSetup {
            config:       cfg,
            model_config: &model_config,
            evaluator:    &evaluator,
            checkpoints:  &checkpoints,
            metrics:      &metrics,
        };
        let (model, summary) = run_training::<B>(&setup, train, valid, device)?;

        // ── Step 6: Test ──────────────────────────────────────────────────────
        println!("Testing model");
        let result = evaluate_model(&model, &evaluator, test, cfg.batch_size, device)?;
        let test_rocauc = result.require_rocauc()?;
        println!("Done. Test loss: {:.4}. ROC-AUC: {:.2}", result.loss, test_rocauc);

        Ok(TrainReport {
            test_loss:      result.loss,
            test_rocauc,
            best_epoch:     summary.best_epoch,
            selected_epoch: summary.selected_epoch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::application::fixtures::MemorySource;

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            epochs:         2,
            batch_size:     4,
            hidden:         8,
            num_workers:    0,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = TrainConfig::default();
        assert!(TrainConfig { batch_size: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { epochs: 0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { lr: 0.0, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { lr: f64::NAN, ..base.clone() }.validate().is_err());
        assert!(TrainConfig { num_layers: 0, ..base }.validate().is_err());
    }

    #[test]
    fn test_end_to_end_run_reports_test_scores() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = TrainUseCase::new(config(tmp.path()));

        let report = use_case
            .execute_with::<Autodiff<NdArray>>(&MemorySource::balanced(20), &Default::default())
            .unwrap();

        assert!(report.test_loss.is_finite());
        assert!((0.0..=1.0).contains(&report.test_rocauc));
        assert!((1..=2).contains(&report.best_epoch));
        assert_eq!(report.selected_epoch, 2);
        assert!(tmp.path().join("train_config.json").exists());
        assert!(tmp.path().join("model_config.json").exists());
    }

    #[test]
    fn test_select_is_optional_in_saved_configs() {
        let mut json = serde_json::to_value(TrainConfig::default()).unwrap();
        json.as_object_mut().unwrap().remove("select");
        let cfg: TrainConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.select, ModelSelection::Last);

        let best = TrainConfig { select: ModelSelection::Best, ..TrainConfig::default() };
        assert!(serde_json::to_string(&best).unwrap().contains("\"select\":\"best\""));
    }

    #[test]
    fn test_single_class_test_split_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = TrainUseCase::new(config(tmp.path()));
        let source = MemorySource::balanced(20).with_negative_test_split();

        let err = use_case
            .execute_with::<Autodiff<NdArray>>(&source, &Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("ROC-AUC"));
    }
}
