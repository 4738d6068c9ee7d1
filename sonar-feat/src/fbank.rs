//! Log-mel filterbank and delta features on plain arrays.

use crate::error::Result;
use crate::params::FeatParams;
use crate::spectrum::powspec;
use ndarray::{Array2, Array3, ArrayView2, Axis, stack};

/// Regression window of the delta features.
pub const DELTA_WINDOW: usize = 2;

/// Stand-in for zero filterbank energies before the log, double precision epsilon.
pub const ENERGY_FLOOR: f32 = f64::EPSILON as f32;

/// Convert frequency in Hz to mel scale.
pub fn hz_to_mel(freq: f32) -> f32 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

/// Convert mel scale to frequency in Hz.
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Create mel filterbank, `[nfilt, nfft / 2 + 1]`.
///
/// Triangular filters whose edges are evenly spaced on the mel scale between
/// `lowfreq` and `highfreq`, snapped to FFT bins.
pub fn mel_filterbank(
    nfilt: usize,
    nfft: usize,
    sample_rate: u32,
    lowfreq: f32,
    highfreq: f32,
) -> Array2<f32> {
    let freq_bins = nfft / 2 + 1;
    let mut filterbank = Array2::<f32>::zeros((nfilt, freq_bins));

    let low_mel = hz_to_mel(lowfreq);
    let high_mel = hz_to_mel(highfreq);

    let bins: Vec<usize> = (0..nfilt + 2)
        .map(|i| {
            let mel = low_mel + (high_mel - low_mel) * i as f32 / (nfilt + 1) as f32;
            ((nfft + 1) as f32 * mel_to_hz(mel) / sample_rate as f32).floor() as usize
        })
        .collect();

    for j in 0..nfilt {
        let (left, center, right) = (bins[j], bins[j + 1], bins[j + 2]);

        for i in left..center.min(freq_bins) {
            filterbank[[j, i]] = (i - left) as f32 / (center - left) as f32;
        }
        for i in center..right.min(freq_bins) {
            filterbank[[j, i]] = (right - i) as f32 / (right - center) as f32;
        }
    }

    filterbank
}

/// Log filterbank energies from a power spectrogram, `[nframe, nfilt]`.
///
/// Zero energies are replaced by [`ENERGY_FLOOR`] before the log.
pub fn logfbank_from_powspec(powspec: &Array2<f32>, params: &FeatParams) -> Array2<f32> {
    let filterbank = mel_filterbank(
        params.feature_size,
        params.nfft,
        params.sr,
        params.lowfreq,
        params.highfreq_or_nyquist(),
    );

    powspec
        .dot(&filterbank.t())
        .mapv(|e| if e == 0.0 { ENERGY_FLOOR } else { e }.ln())
}

/// Log-mel filterbank features of a waveform, `[nframe, feature_size]`.
pub fn logfbank(samples: &[f32], params: &FeatParams) -> Result<Array2<f32>> {
    let spectrum = powspec(samples, params)?;
    Ok(logfbank_from_powspec(&spectrum, params))
}

/// Regression delta over `n` neighbouring frames on each side.
///
/// Frames beyond either edge repeat the edge frame.
pub fn delta(feat: ArrayView2<f32>, n: usize) -> Array2<f32> {
    let num_frames = feat.nrows();
    if num_frames == 0 || n == 0 {
        return Array2::zeros(feat.raw_dim());
    }

    let denominator = 2.0 * (1..=n).map(|i| (i * i) as f32).sum::<f32>();
    let last = num_frames as isize - 1;
    let frame = |t: isize| feat.row(t.clamp(0, last) as usize);

    let mut out = Array2::<f32>::zeros(feat.raw_dim());
    for (t, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        let t = t as isize;
        for i in 1..=n as isize {
            let diff = &frame(t + i) - &frame(t - i);
            row.scaled_add(i as f32 / denominator, &diff);
        }
    }

    out
}

/// Stack a filterbank with its delta and delta-delta, `[nframe, nfilt, 3]`.
pub fn delta_delta(fbank: &Array2<f32>) -> Result<Array3<f32>> {
    let d1 = delta(fbank.view(), DELTA_WINDOW);
    let d2 = delta(d1.view(), DELTA_WINDOW);

    Ok(stack(Axis(2), &[fbank.view(), d1.view(), d2.view()])?)
}

/// Log-mel filterbank with delta and delta-delta, `[nframe, feature_size, 3]`.
pub fn extract_fbank(samples: &[f32], params: &FeatParams) -> Result<Array3<f32>> {
    let feat = logfbank(samples, params)?;
    delta_delta(&feat)
}
