// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Adam over shuffled disjoint batches, followed each epoch by a
// validation pass, a metrics row and a checkpoint.
//
//   - Training runs on an AutodiffBackend
//   - model.valid() returns the same weights on B::InnerBackend,
//     which is what validation and the returned model use
//   - The best epoch is picked by validation ROC-AUC, then loss
//     (see EpochMetrics::is_improvement_over)
//   - ModelSelection decides whether the final or the best
//     epoch's weights are returned

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{ModelSelection, TrainConfig};
use crate::data::{batcher::DisjointBatcher, dataset::MolDataset};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::evaluator::{evaluate_model, OgbEvaluator};
use crate::ml::model::{MolGnn, MolGnnConfig};

const ADAM_EPSILON: f32 = 1e-7;

/// Everything a training run needs besides the data.
pub struct TrainingSetup<'a> {
    pub config:       &'a TrainConfig,
    pub model_config: &'a MolGnnConfig,
    pub evaluator:    &'a OgbEvaluator,
    pub checkpoints:  &'a CheckpointManager,
    pub metrics:      &'a MetricsLogger,
}

#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub history:        Vec<EpochMetrics>,
    pub best_epoch:     usize,
    /// Epoch whose weights were returned
    pub selected_epoch: usize,
}

impl TrainingSummary {
    pub fn best(&self) -> Option<&EpochMetrics> {
        self.history.iter().find(|m| m.epoch == self.best_epoch)
    }
}

/// Train for `config.epochs` epochs and return the weights chosen by
/// `config.select`, on the inner backend.
pub fn run_training<B: AutodiffBackend>(
    setup:         &TrainingSetup<'_>,
    train_dataset: MolDataset,
    valid_dataset: MolDataset,
    device:        &B::Device,
) -> Result<(MolGnn<B::InnerBackend>, TrainingSummary)> {
    let cfg = setup.config;
    B::seed(cfg.seed);

    let mut model: MolGnn<B> = setup.model_config.init(device);
    tracing::info!(
        "Model ready: {} ECC layers, hidden={}, tasks={}",
        setup.model_config.num_layers, setup.model_config.hidden, setup.model_config.num_tasks,
    );

    let mut optim = AdamConfig::new().with_epsilon(ADAM_EPSILON).init();

    let mut builder = DataLoaderBuilder::new(DisjointBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed);
    if cfg.num_workers > 0 {
        builder = builder.num_workers(cfg.num_workers);
    }
    let train_loader = builder.build(train_dataset);

    let mut history: Vec<EpochMetrics> = Vec::with_capacity(cfg.epochs);
    let mut best: Option<(EpochMetrics, Option<MolGnn<B::InnerBackend>>)> = None;

    println!("Fitting model");
    for epoch in 1..=cfg.epochs {
        // ── Training phase ──────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(&batch);
            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let train_loss = if batches > 0 {
            loss_sum / batches as f64
        } else {
            tracing::warn!("Epoch {} saw no training batches", epoch);
            f64::NAN
        };

        // ── Validation phase ────────────────────────────────────
        let model_valid = model.valid();
        let valid = evaluate_model(
            &model_valid,
            setup.evaluator,
            valid_dataset.clone(),
            cfg.batch_size,
            device,
        )?;

        let metrics = EpochMetrics::new(epoch, train_loss, valid.loss, valid.rocauc);
        println!(
            "Epoch {:>3}/{} | Loss: {:.4} | val_loss: {:.4} | val_rocauc: {}",
            epoch, cfg.epochs, train_loss, valid.loss,
            valid.rocauc.map_or_else(|| "n/a".to_string(), |s| format!("{s:.4}")),
        );

        setup.metrics.log(&metrics)?;
        setup.checkpoints.save_model(&model, epoch)?;

        let improved = best.as_ref().map_or(true, |(b, _)| metrics.is_improvement_over(b));
        if improved {
            setup.checkpoints.mark_best(epoch)?;
            tracing::info!("New best model at epoch {}", epoch);
            // Only keep a copy of the weights when they may be returned
            let kept = (cfg.select == ModelSelection::Best).then_some(model_valid);
            best = Some((metrics.clone(), kept));
        }
        history.push(metrics);
    }

    let Some((best_metrics, best_model)) = best else {
        anyhow::bail!("Training ran for zero epochs");
    };

    let (selected, selected_epoch) = match (cfg.select, best_model) {
        (ModelSelection::Best, Some(model)) => (model, best_metrics.epoch),
        _ => (model.valid(), cfg.epochs),
    };
    let summary = TrainingSummary { history, best_epoch: best_metrics.epoch, selected_epoch };
    if let Some(best) = summary.best() {
        tracing::info!(
            "Training complete. Best epoch {} (val_loss {:.4}), returning epoch {}",
            best.epoch, best.valid_loss, selected_epoch,
        );
    }
    tracing::info!("Per-epoch metrics in '{}'", setup.metrics.csv_path().display());

    Ok((selected, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use burn::backend::{Autodiff, NdArray};

    use crate::domain::graph::MolGraph;

    type TestBackend = Autodiff<NdArray>;

    /// Two-node graphs; positives carry larger atom features.
    fn dataset(n: usize) -> MolDataset {
        let graphs: Arc<[MolGraph]> = (0..n)
            .map(|i| {
                let y = (i % 2) as f32;
                let x = 0.5 + 2.0 * y;
                MolGraph::new(
                    2, 1,
                    vec![vec![x, 1.0], vec![x, 0.0]],
                    vec![(0, 1), (1, 0)],
                    vec![vec![1.0], vec![1.0]],
                    vec![y],
                )
                .unwrap()
            })
            .collect();
        MolDataset::new(graphs)
    }

    fn config(epochs: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            batch_size: 4,
            lr: 1e-2,
            hidden: 8,
            num_workers: 0,
            ..TrainConfig::default()
        }
    }

    fn run(
        config: TrainConfig,
        train:  MolDataset,
        valid:  MolDataset,
    ) -> (tempfile::TempDir, MolGnn<NdArray>, TrainingSummary) {
        let tmp = tempfile::tempdir().unwrap();
        let model_config = MolGnnConfig::new(2, 1, 1).with_hidden(8);
        let evaluator    = OgbEvaluator::new("ogbg-molhiv", 1);
        let checkpoints  = CheckpointManager::new(tmp.path()).unwrap();
        let metrics      = MetricsLogger::new(tmp.path()).unwrap();
        let setup = TrainingSetup {
            config: &config,
            model_config: &model_config,
            evaluator: &evaluator,
            checkpoints: &checkpoints,
            metrics: &metrics,
        };

        let (model, summary) =
            run_training::<TestBackend>(&setup, train, valid, &Default::default()).unwrap();
        (tmp, model, summary)
    }

    /// Validation loss of `model`, computed the way the trainer does
    fn valid_loss(model: &MolGnn<NdArray>, valid: MolDataset) -> f64 {
        let evaluator = OgbEvaluator::new("ogbg-molhiv", 1);
        evaluate_model(model, &evaluator, valid, 4, &Default::default()).unwrap().loss
    }

    #[test]
    fn test_one_checkpoint_and_row_per_epoch() {
        let (tmp, _, summary) = run(config(3), dataset(12), dataset(6));

        assert_eq!(summary.history.len(), 3);
        assert!(summary.history.iter().all(|m| m.train_loss.is_finite()));
        assert!((1..=3).contains(&summary.best_epoch));
        for epoch in 1..=3 {
            assert!(tmp.path().join(format!("model_epoch_{epoch}.mpk")).exists());
        }
        assert!(tmp.path().join("best_epoch.json").exists());

        let csv = std::fs::read_to_string(tmp.path().join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_returns_final_epoch_by_default() {
        let cfg = TrainConfig { lr: 5e-2, ..config(6) };
        let (_tmp, model, summary) = run(cfg, dataset(16), dataset(8));

        assert_eq!(summary.selected_epoch, 6);
        let last = summary.history.last().unwrap();
        assert!((valid_loss(&model, dataset(8)) - last.valid_loss).abs() < 1e-9);
    }

    #[test]
    fn test_best_selection_breaks_rocauc_ties_on_loss() {
        let cfg = TrainConfig { lr: 5e-2, select: ModelSelection::Best, ..config(6) };
        let (_tmp, model, summary) = run(cfg, dataset(16), dataset(8));

        let top = summary.history.iter()
            .filter_map(|m| m.valid_rocauc)
            .fold(f64::MIN, f64::max);
        let lowest_loss_at_top = summary.history.iter()
            .filter(|m| m.valid_rocauc == Some(top))
            .min_by(|a, b| a.valid_loss.total_cmp(&b.valid_loss))
            .unwrap();

        assert_eq!(summary.selected_epoch, summary.best_epoch);
        assert_eq!(summary.best_epoch, lowest_loss_at_top.epoch);
        assert!((valid_loss(&model, dataset(8)) - lowest_loss_at_top.valid_loss).abs() < 1e-9);
    }

    #[test]
    fn test_threaded_loader_trains_every_graph() {
        let cfg = TrainConfig { num_workers: 2, ..config(2) };
        let (_tmp, _, summary) = run(cfg, dataset(12), dataset(6));

        assert_eq!(summary.history.len(), 2);
        assert!(summary.history.iter().all(|m| m.train_loss.is_finite()));
        assert!(summary.history.iter().all(|m| m.valid_rocauc.is_some()));
    }

    #[test]
    fn test_empty_training_split_gives_nan_loss() {
        let (_tmp, _, summary) = run(config(1), dataset(4).subset(&[]), dataset(4));
        assert!(summary.history[0].train_loss.is_nan());
    }
}
