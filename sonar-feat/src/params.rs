//! Feature extraction parameters.

use crate::audio::DEFAULT_SAMPLE_RATE;
use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_WINLEN: f32 = 0.025;
const DEFAULT_WINSTEP: f32 = 0.01;
const DEFAULT_FEATURE_SIZE: usize = 40;
const DEFAULT_NFFT: usize = 512;
const DEFAULT_PREEMPH: f32 = 0.97;

/// Supported feature methods of [`crate::extract::extract_feat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatType {
    /// Normalized log power spectrogram, `[nframe, nfft / 2 + 1]`
    Spectrogram,
    /// Log-mel filterbank, `[nframe, feature_size]`
    LogFbank,
}

impl FromStr for FeatType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spectrogram" => Ok(Self::Spectrogram),
            "logfbank" => Ok(Self::LogFbank),
            other => Err(ConfigError::UnsupportedFeatType(other.to_string())),
        }
    }
}

/// Parameters shared by every extraction entry point.
#[derive(clap::Args, Clone, Debug)]
pub struct FeatParams {
    /// Expected sample rate in Hz
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sr: u32,

    /// Window length in seconds
    #[arg(long, default_value_t = DEFAULT_WINLEN)]
    pub winlen: f32,

    /// Window step in seconds
    #[arg(long, default_value_t = DEFAULT_WINSTEP)]
    pub winstep: f32,

    /// Number of mel filters
    #[arg(long, default_value_t = DEFAULT_FEATURE_SIZE)]
    pub feature_size: usize,

    /// FFT size
    #[arg(long, default_value_t = DEFAULT_NFFT)]
    pub nfft: usize,

    /// Lowest filterbank edge in Hz
    #[arg(long, default_value_t = 0.0)]
    pub lowfreq: f32,

    /// Highest filterbank edge in Hz (default: sr / 2)
    #[arg(long)]
    pub highfreq: Option<f32>,

    /// Pre-emphasis coefficient (0 disables)
    #[arg(long, default_value_t = DEFAULT_PREEMPH)]
    pub preemph: f32,

    /// Feature method: "spectrogram" or "logfbank"
    #[arg(long, default_value = "logfbank")]
    pub feat_type: String,

    /// Directory for .npy outputs (default: next to each wav)
    #[arg(long)]
    pub save_feat_path: Option<PathBuf>,

    /// Log output paths and shapes without writing
    #[arg(long)]
    pub dry_run: bool,
}

impl Default for FeatParams {
    fn default() -> Self {
        Self {
            sr: DEFAULT_SAMPLE_RATE,
            winlen: DEFAULT_WINLEN,
            winstep: DEFAULT_WINSTEP,
            feature_size: DEFAULT_FEATURE_SIZE,
            nfft: DEFAULT_NFFT,
            lowfreq: 0.0,
            highfreq: None,
            preemph: DEFAULT_PREEMPH,
            feat_type: "logfbank".to_string(),
            save_feat_path: None,
            dry_run: false,
        }
    }
}

impl FeatParams {
    /// Parse the configured feature method.
    pub fn feat_type(&self) -> Result<FeatType, ConfigError> {
        self.feat_type.parse()
    }

    /// Frame length in samples.
    pub fn frame_len(&self) -> usize {
        round_half_up(self.winlen * self.sr as f32)
    }

    /// Frame step in samples.
    pub fn frame_step(&self) -> usize {
        round_half_up(self.winstep * self.sr as f32)
    }

    /// Configured upper edge; zero or negative means unset.
    pub fn spectrogram_highfreq(&self) -> Option<f32> {
        self.highfreq.filter(|&h| h > 0.0)
    }

    /// Upper filterbank edge, defaulting to the Nyquist frequency.
    pub fn highfreq_or_nyquist(&self) -> f32 {
        self.spectrogram_highfreq().unwrap_or(self.sr as f32 / 2.0)
    }

    /// Reject windows and filterbanks that cannot produce a frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_len() == 0 || self.frame_step() == 0 {
            return Err(ConfigError::InvalidWindow {
                winlen: self.winlen,
                winstep: self.winstep,
                sr: self.sr,
            });
        }
        if self.feature_size == 0 || self.nfft == 0 {
            return Err(ConfigError::InvalidFilterbank {
                nfilt: self.feature_size,
                nfft: self.nfft,
            });
        }
        Ok(())
    }
}

/// Round to nearest integer, ties away from zero for positive inputs.
pub(crate) fn round_half_up(x: f32) -> usize {
    (x + 0.5).floor().max(0.0) as usize
}
