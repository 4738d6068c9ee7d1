//! Batch extraction: waveform files in, `.npy` feature files out.

use crate::audio::load_wav;
use crate::error::Result;
use crate::fbank::logfbank_from_powspec;
use crate::params::{FeatParams, FeatType};
use crate::spectrum::{freq_resolution, logpowspec, points, powspec};
use crate::tensor::{TensorFbank, add_delta_delta, tensor_to_array3};
use candle::Device;
use ndarray::{Array2, s};
use ndarray_npy::write_npy;
use std::path::{Path, PathBuf};

/// Resolve where the features of `wav_path` are written.
///
/// `<stem>.npy` inside `save_dir` when given, otherwise next to the wav.
pub fn feat_path(wav_path: &Path, save_dir: Option<&Path>) -> PathBuf {
    match save_dir {
        Some(dir) => {
            let mut name = wav_path
                .file_stem()
                .unwrap_or(wav_path.as_os_str())
                .to_os_string();
            name.push(".npy");
            dir.join(name)
        }
        None => wav_path.with_extension("npy"),
    }
}

/// Compute features of one waveform with the pure-array path.
pub fn compute_feat(samples: &[f32], params: &FeatParams, feat_type: FeatType) -> Result<Array2<f32>> {
    let spectrum = powspec(samples, params)?;
    tracing::trace!("apply power spectrogram");

    let feat = match feat_type {
        FeatType::Spectrogram => {
            let feat = logpowspec(&spectrum, true)?;
            match params.spectrogram_highfreq() {
                Some(highfreq) => {
                    let resolution = freq_resolution(params.sr, params.nfft);
                    let bins = (points(highfreq, resolution) as usize).min(feat.ncols());
                    tracing::trace!(bins, "slice spectrogram");
                    feat.slice(s![.., ..bins]).to_owned()
                }
                None => feat,
            }
        }
        FeatType::LogFbank => {
            // band edges only slice spectrograms; the filterbank spans 0 Hz to Nyquist
            let full_band = FeatParams {
                lowfreq: 0.0,
                highfreq: None,
                ..params.clone()
            };
            logfbank_from_powspec(&spectrum, &full_band)
        }
    };

    Ok(feat)
}

/// Extract features from each wav with the pure-array path and dump them.
///
/// The feature type is checked before any file is read. Returns the output
/// paths in input order.
pub fn extract_feat<P: AsRef<Path>>(paths: &[P], params: &FeatParams) -> Result<Vec<PathBuf>> {
    let feat_type = params.feat_type()?;
    params.validate()?;
    tracing::debug!(?params, "extract feat");

    let save_dir = params.save_feat_path.as_deref();
    if let Some(dir) = save_dir
        && !params.dry_run
    {
        std::fs::create_dir_all(dir)?;
    }

    paths
        .iter()
        .map(|wav_path| {
            let wav_path = wav_path.as_ref();
            let out_path = feat_path(wav_path, save_dir);
            tracing::debug!(input = %wav_path.display(), output = %out_path.display());

            let samples = load_wav(wav_path, params.sr)?;
            let feat = compute_feat(&samples, params, feat_type)?;

            if params.dry_run {
                tracing::info!(path = %out_path.display(), shape = ?feat.shape(), "save feat");
            } else {
                write_npy(&out_path, &feat)?;
            }

            Ok(out_path)
        })
        .collect()
}

/// Extract `[nframe, feature_size, 1]` filterbanks with the tensor path.
///
/// Outputs are always written next to each wav.
pub fn extract_filterbank<P: AsRef<Path>>(
    paths: &[P],
    params: &FeatParams,
    device: &Device,
) -> Result<Vec<PathBuf>> {
    extract_filterbank_with_deltas(paths, params, device, 0)
}

/// Like [`extract_filterbank`], with `order` delta channels appended:
/// `[nframe, feature_size, order + 1]`.
pub fn extract_filterbank_with_deltas<P: AsRef<Path>>(
    paths: &[P],
    params: &FeatParams,
    device: &Device,
    order: usize,
) -> Result<Vec<PathBuf>> {
    let extractor = TensorFbank::new(params.clone(), device)?;

    paths
        .iter()
        .map(|wav_path| {
            let wav_path = wav_path.as_ref();
            let out_path = feat_path(wav_path, None);
            tracing::debug!(input = %wav_path.display(), output = %out_path.display());

            let samples = load_wav(wav_path, params.sr)?;
            let feat = add_delta_delta(&extractor.process(&samples)?, order)?;
            let feat = tensor_to_array3(&feat)?;

            if params.dry_run {
                tracing::info!(path = %out_path.display(), shape = ?feat.shape(), "save feat");
            } else {
                write_npy(&out_path, &feat)?;
            }

            Ok(out_path)
        })
        .collect()
}

/// Log-mel filterbank of a wav with delta and delta-delta, `[nframe, feature_size, 3]`.
pub fn fbank_with_deltas(wav_path: &Path, params: &FeatParams) -> Result<ndarray::Array3<f32>> {
    let samples = load_wav(wav_path, params.sr)?;
    let spectrum = powspec(&samples, params)?;
    let feat = logfbank_from_powspec(&spectrum, params);
    crate::fbank::delta_delta(&feat)
}
