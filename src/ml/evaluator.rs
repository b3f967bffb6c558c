// ============================================================
// Layer 5 - Evaluator
// ============================================================
// Scores a model the way the OGB leaderboard does for binary
// molecule tasks: ROC-AUC per task, averaged over the tasks
// that contain both a positive and a negative example.
//
// The loss reported next to it is binary cross-entropy over all
// stacked predictions, with probabilities clipped away from 0
// and 1 so a confident mistake stays finite.

use anyhow::{bail, Context, Result};
use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    prelude::*,
};

use crate::data::{batcher::DisjointBatcher, dataset::MolDataset};
use crate::ml::model::MolGnn;

const PROB_EPSILON: f64 = 1e-7;

/// Area under the ROC curve for one task.
///
/// Uses the rank-sum form with average ranks for tied scores,
/// which equals the trapezoidal area under the ROC curve.
/// Returns `None` unless both classes are present.
pub fn roc_auc(labels: &[f32], scores: &[f32]) -> Option<f64> {
    let n_pos = labels.iter().filter(|&&y| y == 1.0).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // 1-based ranks; a run of equal scores shares the mean of its ranks
    let mut rank_sum_pos = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let mean_rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            if labels[k] == 1.0 {
                rank_sum_pos += mean_rank;
            }
        }
        i = j + 1;
    }

    let (p, n) = (n_pos as f64, n_neg as f64);
    Some((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * n))
}

/// Mean binary cross-entropy between labels and probabilities.
pub fn binary_cross_entropy(labels: &[f32], probs: &[f32]) -> f64 {
    if labels.is_empty() {
        return f64::NAN;
    }
    let total: f64 = labels
        .iter()
        .zip(probs)
        .map(|(&y, &p)| {
            let p = (p as f64).clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
            let y = y as f64;
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / labels.len() as f64
}

/// ROC-AUC evaluator for an OGB binary classification dataset.
#[derive(Debug, Clone)]
pub struct OgbEvaluator {
    name:      String,
    num_tasks: usize,
}

impl OgbEvaluator {
    pub fn new(name: impl Into<String>, num_tasks: usize) -> Self {
        Self { name: name.into(), num_tasks }
    }

    /// `y_true` and `y_pred` are row-major `[num_graphs, num_tasks]`.
    pub fn eval(&self, y_true: &[f32], y_pred: &[f32]) -> Result<f64> {
        if y_true.len() != y_pred.len() {
            bail!(
                "{}: y_true has {} values but y_pred has {}",
                self.name, y_true.len(), y_pred.len()
            );
        }
        if self.num_tasks == 0 || y_true.len() % self.num_tasks != 0 {
            bail!(
                "{}: {} values do not form rows of {} tasks",
                self.name, y_true.len(), self.num_tasks
            );
        }

        let per_task: Vec<f64> = (0..self.num_tasks)
            .filter_map(|t| {
                let labels: Vec<f32> = y_true.iter().skip(t).step_by(self.num_tasks).copied().collect();
                let scores: Vec<f32> = y_pred.iter().skip(t).step_by(self.num_tasks).copied().collect();
                roc_auc(&labels, &scores)
            })
            .collect();

        if per_task.is_empty() {
            bail!("No positively labeled data available. Cannot compute ROC-AUC.");
        }
        Ok(per_task.iter().sum::<f64>() / per_task.len() as f64)
    }
}

/// Loss and score of a model on one split
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss:       f64,
    pub rocauc:     Option<f64>,
    pub num_graphs: usize,
}

/// Run `model` over `dataset` without gradients and score it.
///
/// ROC-AUC is `None` when the split lacks one of the classes.
pub fn evaluate_model<B: Backend>(
    model:      &MolGnn<B>,
    evaluator:  &OgbEvaluator,
    dataset:    MolDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<Evaluation> {
    let num_graphs = dataset.len();
    let loader = DataLoaderBuilder::new(DisjointBatcher::<B>::new(device.clone()))
        .batch_size(batch_size)
        .build(dataset);

    let mut y_true = Vec::new();
    let mut y_pred = Vec::new();
    for batch in loader.iter() {
        let probs = model
            .predict(&batch)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read predictions: {e:?}"))?;
        y_pred.extend(probs);
        y_true.extend_from_slice(&batch.label_values);
    }

    let loss = binary_cross_entropy(&y_true, &y_pred);
    let rocauc = match evaluator.eval(&y_true, &y_pred) {
        Ok(score) => Some(score),
        Err(e) => {
            tracing::warn!("ROC-AUC unavailable: {e}");
            None
        }
    };

    Ok(Evaluation { loss, rocauc, num_graphs })
}

impl Evaluation {
    /// ROC-AUC, or an error explaining why there is none
    pub fn require_rocauc(&self) -> Result<f64> {
        self.rocauc
            .context("ROC-AUC is undefined: the evaluated split contains a single class")
    }
}
