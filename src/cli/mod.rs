// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with `clap` and routes each
// subcommand to its use case in Layer 2:
//
//   1. `train`    — trains Match-LSTM on SQuAD id files
//   2. `evaluate` — F1 / EM of a checkpoint on a split
//   3. `ask`      — answers one question about one passage
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;

use crate::infra::logging;
use crate::ml::predictor::InferBackend;
use commands::{AskArgs, Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "match-lstm-qa",
    version,
    about = "Match-LSTM + Answer Pointer reading comprehension on SQuAD."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Directory `train` mirrors its logs into, if any.
    pub fn log_dir(&self) -> Option<&Path> {
        match &self.command {
            Commands::Train(args) => Some(Path::new(&args.log_dir)),
            _ => None,
        }
    }

    /// Install logging, then dispatch to the matching use case.
    pub fn run(self) -> Result<()> {
        logging::init(self.log_dir())?;
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Ask(args)      => run_ask(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on SQuAD data in: {}", args.data_dir);

    let train_dir = args.train_dir.clone();
    let report    = TrainUseCase::new(args.into()).execute()?;

    match report.last {
        Some(last) => println!(
            "Training complete after epoch {}. F1={:.2}% EM={:.2}% (best F1 {:.2}%). Checkpoints in '{}'.",
            last.epoch, last.f1 * 100.0, last.em * 100.0, report.best_f1 * 100.0, train_dir
        ),
        None => println!("No epochs were run."),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let split   = args.split.clone();
    let summary = EvaluateUseCase::<InferBackend>::new(args.into(), Default::default()).execute()?;
    println!(
        "{split}: F1 {:.2}  EM {:.2}  ({} examples)",
        summary.f1 * 100.0,
        summary.em * 100.0,
        summary.count
    );
    Ok(())
}

fn run_ask(args: AskArgs) -> Result<()> {
    use crate::application::ask_use_case::AskUseCase;

    let use_case = AskUseCase::<InferBackend>::new(&args.train_dir, &args.vocab_path, Default::default())?;
    let answer   = use_case.ask(&args.question, &args.context)?;
    println!("\nAnswer: {} (confidence {:.3})", answer.text, answer.confidence);
    Ok(())
}
