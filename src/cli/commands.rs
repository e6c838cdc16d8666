// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate`, `ask`
// and all their configurable flags.
//
// Flag names and defaults follow the training flag table:
//   --learning-rate 0.01  --max-gradient-norm 10  --dropout 0.15
//   --batch-size 10  --epochs 10  --state-size 200  ...
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::evaluate_use_case::EvaluateConfig;
use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::domain::span::PointerMode;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the Match-LSTM model on preprocessed SQuAD id files
    Train(TrainArgs),

    /// Score a trained checkpoint (F1 / EM) on a data split
    Evaluate(EvaluateArgs),

    /// Answer a question about a passage using a trained checkpoint
    Ask(AskArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerArg {
    Adam,
    Sgd,
}

impl From<OptimizerArg> for OptimizerKind {
    fn from(a: OptimizerArg) -> Self {
        match a {
            OptimizerArg::Adam => OptimizerKind::Adam,
            OptimizerArg::Sgd  => OptimizerKind::Sgd,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerModeArg {
    /// Predict start and end positions
    Boundary,
    /// Predict every answer position, then the end-of-answer marker
    Sequence,
}

impl From<PointerModeArg> for PointerMode {
    fn from(a: PointerModeArg) -> Self {
        match a {
            PointerModeArg::Boundary => PointerMode::Boundary,
            PointerModeArg::Sequence => PointerMode::Sequence,
        }
    }
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Learning rate
    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f64,

    /// Clip gradients to this norm
    #[arg(long, default_value_t = 10.0)]
    pub max_gradient_norm: f32,

    /// Fraction of units randomly dropped on the embedding layer
    #[arg(long, default_value_t = 0.15)]
    pub dropout: f64,

    /// Batch size to use during training
    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Number of epochs to train
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Size of each recurrent layer
    #[arg(long, default_value_t = 200)]
    pub state_size: usize,

    /// Size of the pretrained vocabulary vectors
    #[arg(long, default_value_t = 100)]
    pub embedding_size: usize,

    /// SQuAD directory
    #[arg(long, default_value = "data/squad")]
    pub data_dir: String,

    /// Training directory to save the model parameters
    #[arg(long, default_value = "train")]
    pub train_dir: String,

    /// Training directory to load model parameters from to resume training (default: --train-dir)
    #[arg(long, default_value = "")]
    pub load_train_dir: String,

    /// Path to store log and flag files
    #[arg(long, default_value = "log")]
    pub log_dir: String,

    #[arg(long, value_enum, default_value_t = OptimizerArg::Adam)]
    pub optimizer: OptimizerArg,

    /// How many iterations to do per print (0 = never)
    #[arg(long, default_value_t = 1)]
    pub print_every: usize,

    /// How many checkpoints to keep, 0 indicates keep all
    #[arg(long, default_value_t = 0)]
    pub keep: usize,

    /// Path to the vocab file
    #[arg(long, default_value = "data/squad/vocab.dat")]
    pub vocab_path: String,

    /// Path to the trimmed GloVe table (default: {data_dir}/glove.trimmed.{embedding_size}.npz); a .txt path reads raw GloVe
    #[arg(long, default_value = "")]
    pub embed_path: String,

    /// Questions are truncated/padded to this many tokens
    #[arg(long, default_value_t = 20)]
    pub max_question_length: usize,

    /// Contexts are truncated/padded to this many tokens
    #[arg(long, default_value_t = 200)]
    pub max_context_length: usize,

    /// Longest answer span (tokens) the decoder may produce
    #[arg(long, default_value_t = 15)]
    pub max_answer_length: usize,

    /// Validation examples scored for F1/EM per epoch (0 = all)
    #[arg(long, default_value_t = 100)]
    pub evaluate: usize,

    /// Learning rate multiplier applied after every epoch
    #[arg(long, default_value_t = 1.0)]
    pub lr_decay: f64,

    #[arg(long, value_enum, default_value_t = PointerModeArg::Boundary)]
    pub pointer_mode: PointerModeArg,

    /// Fine-tune the pretrained word vectors
    #[arg(long, default_value_t = false)]
    pub train_embeddings: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            learning_rate:       a.learning_rate,
            max_gradient_norm:   a.max_gradient_norm,
            dropout:             a.dropout,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            state_size:          a.state_size,
            embedding_size:      a.embedding_size,
            data_dir:            a.data_dir,
            train_dir:           a.train_dir,
            load_train_dir:      a.load_train_dir,
            log_dir:             a.log_dir,
            optimizer:           a.optimizer.into(),
            print_every:         a.print_every,
            keep:                a.keep,
            vocab_path:          a.vocab_path,
            embed_path:          a.embed_path,
            max_question_length: a.max_question_length,
            max_context_length:  a.max_context_length,
            max_answer_length:   a.max_answer_length,
            evaluate:            a.evaluate,
            lr_decay:            a.lr_decay,
            pointer_mode:        a.pointer_mode.into(),
            train_embeddings:    a.train_embeddings,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Split to score ("val", "dev", ...)
    #[arg(long, default_value = "val")]
    pub split: String,

    #[arg(long, default_value = "data/squad")]
    pub data_dir: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "train")]
    pub train_dir: String,

    #[arg(long, default_value = "data/squad/vocab.dat")]
    pub vocab_path: String,

    /// Examples to score (0 = whole split)
    #[arg(long, default_value_t = 0)]
    pub sample: usize,

    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            data_dir:   a.data_dir,
            train_dir:  a.train_dir,
            vocab_path: a.vocab_path,
            split:      a.split,
            sample:     a.sample,
            batch_size: a.batch_size,
        }
    }
}

/// All arguments for the `ask` command
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The natural language question to answer
    #[arg(long)]
    pub question: String,

    /// The passage containing the answer
    #[arg(long)]
    pub context: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "train")]
    pub train_dir: String,

    #[arg(long, default_value = "data/squad/vocab.dat")]
    pub vocab_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["match-lstm-qa", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let defaults = TrainConfig::default();

        assert_eq!(
            serde_json::to_value(&cfg).unwrap(),
            serde_json::to_value(&defaults).unwrap()
        );
    }

    #[test]
    fn test_train_flags_parse() {
        let cli = Cli::try_parse_from([
            "match-lstm-qa", "train",
            "--optimizer", "sgd",
            "--pointer-mode", "sequence",
            "--keep", "3",
            "--learning-rate", "0.002",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.optimizer, OptimizerKind::Sgd);
        assert_eq!(cfg.pointer_mode, PointerMode::Sequence);
        assert_eq!(cfg.keep, 3);
        assert_eq!(cfg.learning_rate, 0.002);
    }

    #[test]
    fn test_ask_requires_question_and_context() {
        assert!(Cli::try_parse_from(["match-lstm-qa", "ask", "--question", "who?"]).is_err());
        assert!(Cli::try_parse_from([
            "match-lstm-qa", "ask", "--question", "who?", "--context", "nobody",
        ])
        .is_ok());
    }
}
