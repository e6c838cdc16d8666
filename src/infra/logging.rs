// ============================================================
// Layer 6 — Logging Setup
// ============================================================
// One tracing subscriber for the whole process:
//
//   registry
//     ├── EnvFilter   RUST_LOG, defaulting to match_lstm_qa=info
//     ├── fmt layer   → stderr
//     └── fmt layer   → {log_dir}/log.txt   (train only, no ANSI)
//
// Reference: tracing-subscriber docs (Layer composition)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_DIRECTIVE: &str = "match_lstm_qa=info";

/// Install the global subscriber. With `log_dir` set, everything
/// is also appended to `{log_dir}/log.txt`.
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(DEFAULT_DIRECTIVE.parse().context("Bad default log directive")?);

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log dir '{}'", dir.display()))?;
            let path = dir.join("log.txt");
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Cannot open '{}'", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Tracing subscriber already installed")?;
    Ok(())
}
