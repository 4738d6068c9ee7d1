//! Error types for sonar-feat organized by processing stage.

use ndarray::ShapeError;
use ndarray_npy::WriteNpyError;
use ndarray_stats::errors::MinMaxError;
use thiserror::Error;

/// Feature extraction error variants organized by processing stage.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration stage error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Audio loading stage error
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Feature computation stage error
    #[error(transparent)]
    Compute(#[from] ComputeError),

    /// Feature persistence error
    #[error(transparent)]
    Save(#[from] WriteNpyError),
}

/// Configuration errors (feature type, window parameters).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Feature type string is not one of the supported methods
    #[error("unsupported feature type: {0:?} (expected \"spectrogram\" or \"logfbank\")")]
    UnsupportedFeatType(String),

    /// Window length or step resolves to zero samples
    #[error("invalid window: winlen {winlen}s / winstep {winstep}s at {sr}Hz")]
    InvalidWindow { winlen: f32, winstep: f32, sr: u32 },

    /// Filter count or FFT size is zero
    #[error("invalid filterbank: {nfilt} filters, {nfft} fft points")]
    InvalidFilterbank { nfilt: usize, nfft: usize },
}

/// Audio loading and validation errors.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Sample rate of the file differs from the configured one
    #[error("sampling rate must be {expected}Hz, got {got}Hz")]
    SampleRateMismatch { expected: u32, got: u32 },

    /// File carries no channel or no sample
    #[error("empty audio: {0}")]
    Empty(String),

    /// IO error during audio loading
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WAV file format error
    #[error(transparent)]
    Hound(#[from] hound::Error),
}

/// Numeric errors raised by the array and tensor paths.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// Input array does not have the expected layout
    #[error("expected {expected}, got shape {got:?}")]
    UnexpectedShape { expected: &'static str, got: Vec<usize> },

    /// candle tensor error
    #[error(transparent)]
    Candle(#[from] candle::Error),

    /// ndarray shape error
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// ndarray-stats min/max error
    #[error(transparent)]
    MinMax(#[from] MinMaxError),
}

/// Result type alias for sonar-feat operations.
pub type Result<T> = std::result::Result<T, Error>;

// hound::Error → AudioError → Error
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Audio(AudioError::Hound(e))
    }
}

// std::io::Error → AudioError → Error
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Audio(AudioError::Io(e))
    }
}

// candle::Error → ComputeError → Error
impl From<candle::Error> for Error {
    fn from(e: candle::Error) -> Self {
        Error::Compute(ComputeError::Candle(e))
    }
}

// ShapeError → ComputeError → Error
impl From<ShapeError> for Error {
    fn from(e: ShapeError) -> Self {
        Error::Compute(ComputeError::Shape(e))
    }
}

// MinMaxError → ComputeError → Error
impl From<MinMaxError> for Error {
    fn from(e: MinMaxError) -> Self {
        Error::Compute(ComputeError::MinMax(e))
    }
}
