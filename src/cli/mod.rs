// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
//   1. `train`    - fit on an OGB dataset, report test ROC-AUC
//   2. `evaluate` - reload the best checkpoint and score a split

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "mol-gnn",
    version = "0.1.0",
    about = "Train an edge-conditioned GNN on OGB molecules and score it with ROC-AUC."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on '{}' from '{}'", args.dataset, args.root);
    let report = TrainUseCase::new(args.into()).execute()?;
    tracing::info!(
        "Best validation epoch: {}, test scores from epoch {}",
        report.best_epoch, report.selected_epoch,
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    EvaluateUseCase::new(args.checkpoint_dir, args.split.into(), args.batch_size).execute()?;
    Ok(())
}
