//! Error types for sonar-models organized by stage.

use ndarray_npy::ReadNpyError;
use std::path::PathBuf;
use thiserror::Error;

/// Model error variants organized by stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Construction or forward pass error
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Model name not present in the registry
    #[error("unknown model: {0:?}")]
    UnknownModel(String),

    /// `use_pre_train_emb` is set without `embedding_path`
    #[error("model.use_pre_train_emb requires model.embedding_path")]
    MissingEmbeddingPath,

    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file is not valid YAML for the expected layout
    #[error(transparent)]
    Parse(#[from] serde_yaml::Error),
}

/// Construction and forward pass errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Pretrained embedding file could not be read
    #[error("failed to load embedding {path}: {source}")]
    Embedding {
        path: PathBuf,
        source: ReadNpyError,
    },

    /// Pretrained embedding does not match `[vocab_size, embedding_size]`
    #[error("embedding shape mismatch: expected {expected:?}, got {got:?}")]
    EmbeddingShape {
        expected: [usize; 2],
        got: Vec<usize>,
    },

    /// Input batch is not `[batch, time]`
    #[error("expected token ids of shape [batch, time], got {0:?}")]
    InputRank(Vec<usize>),

    /// Input is longer than the configured `max_len`
    #[error("input length {len} exceeds max_len {max_len}")]
    InputTooLong { len: usize, max_len: usize },

    /// candle error
    #[error(transparent)]
    Candle(#[from] candle::Error),
}

/// Result type alias for sonar-models operations.
pub type Result<T> = std::result::Result<T, Error>;

// candle::Error → ModelError → Error
impl From<candle::Error> for Error {
    fn from(e: candle::Error) -> Self {
        Error::Model(ModelError::Candle(e))
    }
}

// serde_yaml::Error → ConfigError → Error
impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(ConfigError::Parse(e))
    }
}
