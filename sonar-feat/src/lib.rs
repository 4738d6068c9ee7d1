//! sonar-feat: acoustic feature extraction for speech tasks.
//!
//! Turns waveform files into fixed-layout feature arrays and persists them as
//! `.npy` files next to the audio (or under a dedicated directory).
//!
//! # Paths
//!
//! Two interchangeable computation paths produce numerically compatible
//! filterbanks:
//!
//! - [`fbank`]: pure `ndarray` implementation (log-fbank, deltas)
//! - [`tensor`]: candle tensor implementation on any [`candle::Device`]
//!
//! # Quick Start
//!
//! ```ignore
//! use sonar_feat::extract::extract_feat;
//! use sonar_feat::params::FeatParams;
//!
//! let params = FeatParams {
//!     feat_type: "logfbank".to_string(),
//!     ..Default::default()
//! };
//! let written = extract_feat(&["utt1.wav", "utt2.wav"], &params)?;
//! ```

pub mod audio;
pub mod error;
pub mod extract;
pub mod fbank;
pub mod params;
pub mod spectrum;
pub mod tensor;
