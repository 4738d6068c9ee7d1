//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use eyre::Result;
use sonar_data::config::Mode;
use sonar_feat::params::FeatParams;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "sonar")]
#[command(about = "Speech features, minibatches and text models")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract spectrogram or log-fbank features to .npy
    Feat {
        /// Input WAV files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        params: FeatParams,
    },

    /// Extract log-mel filterbanks with the tensor path
    Fbank {
        /// Input WAV files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        params: FeatParams,

        /// Append delta and delta-delta channels
        #[arg(long)]
        delta_delta: bool,
    },

    /// Print minibatch statistics of a configured split
    Batch {
        /// YAML run configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Dataset split
        #[arg(short, long, value_enum, default_value_t = ModeArg::Train)]
        mode: ModeArg,
    },

    /// Build the configured model and run it on a dummy batch
    Model {
        /// YAML run configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Safetensors weights (default: fresh initialization)
        #[arg(short, long)]
        weights: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Train,
    Eval,
    Infer,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Train => Mode::Train,
            ModeArg::Eval => Mode::Eval,
            ModeArg::Infer => Mode::Infer,
        }
    }
}

/// Execute CLI command - separated for testing.
pub fn run_cli(cli: Cli) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");

    match cli.command {
        Commands::Feat { paths, params } => crate::feat::execute(paths, params),
        Commands::Fbank {
            paths,
            params,
            delta_delta,
        } => crate::feat::execute_fbank(paths, params, delta_delta),
        Commands::Batch { config, mode } => crate::batch::execute(config, mode.into()),
        Commands::Model { config, weights } => crate::model::execute(config, weights),
    }
}
