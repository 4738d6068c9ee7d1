//! Error types for sonar-data organized by processing stage.

use ndarray::ShapeError;
use ndarray_npy::ReadNpyError;
use std::path::PathBuf;
use thiserror::Error;

/// Data pipeline error variants organized by processing stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Manifest loading error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Minibatch construction error
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Payload loading and conversion error
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Configuration errors (missing keys, unknown names, inconsistent values).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required key absent from the configuration
    #[error("missing config key: {0}")]
    MissingKey(&'static str),

    /// Task name not present in the task registry
    #[error("unknown task: {0:?}")]
    UnknownTask(String),

    /// Task was constructed for a direction it does not handle
    #[error("task {task} requires type {expected}, got {got}")]
    TaskTypeMismatch {
        task: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    /// Global batch size does not split evenly across devices
    #[error("batch size {batch_size} is not divisible by {num_gpus} gpus")]
    IndivisibleBatchSize { batch_size: usize, num_gpus: usize },

    /// Exactly one manifest path is supported per mode
    #[error("expected exactly one manifest path for {mode}, got {got}")]
    ManifestPathCount { mode: &'static str, got: usize },

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

/// Manifest loading errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// IO error while reading the manifest
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Manifest is not a valid `{"utts": ...}` document
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Entry lacks an input/output stream or a shape dimension
    #[error("utterance {id}: missing {what}")]
    MissingField { id: String, what: String },
}

/// Minibatch construction errors.
#[derive(Debug, Error)]
pub enum BatchError {
    /// No batch budget enabled for the requested strategy
    #[error("invalid batch budget: {0}")]
    InvalidBudget(&'static str),

    /// Fewer utterances than the minimum batch size
    #[error("{utts} utterances cannot fill min_batch_size {min_batch_size}")]
    TooFewUtterances { utts: usize, min_batch_size: usize },

    /// Shuffled batching only supports the sequence-count strategy
    #[error("batch_sort_key=shuffle is only available with batch_strategy=seq")]
    ShuffleRequiresSeq,

    /// A single utterance exceeds a frame budget on its own
    #[error("utterance {id}: {what} length {len} exceeds budget {budget}")]
    ExceedsBudget {
        id: String,
        what: &'static str,
        len: usize,
        budget: usize,
    },

    /// Manifest had no utterance to batch
    #[error("empty manifest")]
    Empty,
}

/// Payload loading and conversion errors.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Stream descriptor carries neither a feature path nor token ids
    #[error("utterance {id}: stream has neither `feat` nor `tokenid`")]
    NoPayload { id: String },

    /// Token id string contains a non-integer
    #[error("utterance {id}: invalid token id {token:?}")]
    InvalidTokenId { id: String, token: String },

    /// Payload kind differs from what the consumer expects
    #[error("expected {expected} payload, got {got}")]
    UnexpectedPayload {
        expected: &'static str,
        got: &'static str,
    },

    /// Feature file could not be read
    #[error("failed to load {path}: {source}")]
    Npy {
        path: PathBuf,
        source: ReadNpyError,
    },

    /// Features of one batch disagree on trailing dimensions
    #[error("inconsistent feature dims in batch: {0:?} vs {1:?}")]
    InconsistentDims(Vec<usize>, Vec<usize>),

    /// ndarray shape error
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Result type alias for sonar-data operations.
pub type Result<T> = std::result::Result<T, Error>;

// serde_yaml::Error → ConfigError → Error
impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(ConfigError::Parse(e))
    }
}

// serde_json::Error → ManifestError → Error
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Manifest(ManifestError::Json(e))
    }
}

// ShapeError → ConvertError → Error
impl From<ShapeError> for Error {
    fn from(e: ShapeError) -> Self {
        Error::Convert(ConvertError::Shape(e))
    }
}
