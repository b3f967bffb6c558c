// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and
// their flags.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{ModelSelection, TrainConfig};
use crate::domain::split::SplitKind;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the molecule classifier, then score it on the test split
    Train(TrainArgs),

    /// Score a trained checkpoint on one split
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// OGB molecular dataset name
    #[arg(long, default_value = "ogbg-molhiv")]
    pub dataset: String,

    /// Directory holding the extracted OGB datasets
    #[arg(long, default_value = "dataset")]
    pub root: String,

    /// Directory to save checkpoints, configs and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Number of full passes through the training split
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Graphs per batch
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Channels of every ECC layer
    #[arg(long, default_value_t = 32)]
    pub hidden: usize,

    /// Number of ECC layers
    #[arg(long, default_value_t = 2)]
    pub layers: usize,

    /// Seed for weight init, shuffling and the fallback split
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Batching threads used by the data loader (0 = batch inline)
    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Weights scored on the test split: the final epoch, or the best
    /// validation epoch
    #[arg(long, value_enum, default_value_t = SelectArg::Last)]
    pub select: SelectArg,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset:        a.dataset,
            root:           a.root,
            checkpoint_dir: a.checkpoint_dir,
            lr:             a.lr,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            hidden:         a.hidden,
            num_layers:     a.layers,
            seed:           a.seed,
            num_workers:    a.num_workers,
            select:         a.select.into(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectArg {
    Last,
    Best,
}

impl From<SelectArg> for ModelSelection {
    fn from(s: SelectArg) -> Self {
        match s {
            SelectArg::Last => ModelSelection::Last,
            SelectArg::Best => ModelSelection::Best,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitArg {
    Train,
    Valid,
    Test,
}

impl From<SplitArg> for SplitKind {
    fn from(s: SplitArg) -> Self {
        match s {
            SplitArg::Train => SplitKind::Train,
            SplitArg::Valid => SplitKind::Valid,
            SplitArg::Test  => SplitKind::Test,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory where `train` saved its checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Which split to score
    #[arg(long, value_enum, default_value_t = SplitArg::Test)]
    pub split: SplitArg,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["mol-gnn", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(TrainConfig::from(args), TrainConfig::default());
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "mol-gnn", "train", "--dataset", "ogbg-molbace", "--lr", "0.01",
            "--epochs", "3", "--layers", "4", "--num-workers", "0", "--select", "best",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.dataset, "ogbg-molbace");
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.num_layers, 4);
        assert_eq!(cfg.num_workers, 0);
        assert_eq!(cfg.select, ModelSelection::Best);
        assert!((cfg.lr - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_split() {
        let cli = Cli::try_parse_from(["mol-gnn", "evaluate", "--split", "valid"]).unwrap();
        let Commands::Evaluate(args) = cli.command else { panic!("expected evaluate") };
        assert_eq!(SplitKind::from(args.split), SplitKind::Valid);
        assert!(Cli::try_parse_from(["mol-gnn", "evaluate", "--split", "dev"]).is_err());
    }
}
