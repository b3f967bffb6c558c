// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder
// (named MessagePack, half precision).
//
// File layout:
//   checkpoints/
//     model_epoch_1.mpk      ← weights after epoch 1
//     model_epoch_2.mpk
//     ...
//     latest_epoch.json      ← last epoch written
//     best_epoch.json        ← epoch with the best validation score
//     train_config.json      ← TrainConfig used for the run
//     model_config.json      ← MolGnnConfig, needed to rebuild the model
//
// The model config is saved separately because loading weights
// requires a model of exactly the same shape.

use anyhow::{anyhow, Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    config::Config,
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::{ModelSelection, TrainConfig};
use crate::ml::model::{MolGnn, MolGnnConfig};

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        // No extension: the recorder appends .mpk
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    /// Save model weights for `epoch` and point latest_epoch.json at it.
    pub fn save_model<B: Backend>(&self, model: &MolGnn<B>, epoch: usize) -> Result<()> {
        let path = self.model_path(epoch);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_epoch("latest_epoch.json", epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Record `epoch` as the best one seen so far.
    pub fn mark_best(&self, epoch: usize) -> Result<()> {
        self.write_epoch("best_epoch.json", epoch)
    }

    /// Load the latest checkpoint, or with `ModelSelection::Best` the
    /// best one (falling back to the latest if no best was recorded).
    ///
    /// `model` must have the architecture the checkpoint was saved with.
    pub fn load_model<B: Backend>(
        &self,
        model:     MolGnn<B>,
        selection: ModelSelection,
        device:    &B::Device,
    ) -> Result<MolGnn<B>> {
        let best = match selection {
            ModelSelection::Best => self.read_epoch("best_epoch.json").ok(),
            ModelSelection::Last => None,
        };
        let epoch = match best {
            Some(epoch) => epoch,
            None        => self.read_epoch("latest_epoch.json")?,
        };
        let path = self.model_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?", path.display())
            })?;
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. Make sure you have run 'train' before 'evaluate'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_model_config(&self, cfg: &MolGnnConfig) -> Result<()> {
        let path = self.dir.join("model_config.json");
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))
    }

    pub fn load_model_config(&self) -> Result<MolGnnConfig> {
        let path = self.dir.join("model_config.json");
        MolGnnConfig::load(&path)
            .map_err(|e| anyhow!("Cannot read model config from '{}': {}", path.display(), e))
    }

    fn write_epoch(&self, file: &str, epoch: usize) -> Result<()> {
        fs::write(self.dir.join(file), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {file}"))
    }

    fn read_epoch(&self, file: &str) -> Result<usize> {
        let s = fs::read_to_string(self.dir.join(file))
            .with_context(|| format!("Cannot find '{file}'. Have you run 'train' first?"))?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
