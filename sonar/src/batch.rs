//! Batch subcommand - minibatch statistics of a configured split.

use eyre::{Context, Result};
use sonar_data::batchfy::get_batches;
use sonar_data::config::{Config, Mode};
use std::fmt;
use std::path::{Path, PathBuf};

/// Minibatch statistics of one split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSummary {
    pub utts: usize,
    pub batches: usize,
    pub min_size: usize,
    pub max_size: usize,
    /// Utterances across all batches, including fill-ins
    pub total: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "utts: {}", self.utts)?;
        writeln!(f, "batches: {}", self.batches)?;
        writeln!(f, "batch size: min {} max {}", self.min_size, self.max_size)?;
        write!(f, "batched utts: {}", self.total)
    }
}

pub fn summarize(config_path: &Path, mode: Mode) -> Result<BatchSummary> {
    let config = Config::from_file(config_path)
        .wrap_err_with(|| format!("failed to load config: {}", config_path.display()))?;

    let batches = get_batches(&config, mode).wrap_err("failed to make batches")?;
    let sizes = batches.data.iter().map(Vec::len);

    Ok(BatchSummary {
        utts: batches.n_utts,
        batches: batches.data.len(),
        min_size: sizes.clone().min().unwrap_or(0),
        max_size: sizes.clone().max().unwrap_or(0),
        total: sizes.sum(),
    })
}

pub fn execute(config: PathBuf, mode: Mode) -> Result<()> {
    let summary = summarize(&config, mode)?;
    tracing::info!(batches = summary.batches, utts = summary.utts, %mode, "batches ready");
    println!("{summary}");
    Ok(())
}
