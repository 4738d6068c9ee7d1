//! Framing and power spectrogram.

use crate::error::Result;
use crate::params::FeatParams;
use ndarray::{Array2, Axis};
use ndarray_stats::QuantileExt;
use rustfft::{FftPlanner, num_complex::Complex};

/// Floor applied before taking the log of a power value.
const POWER_FLOOR: f32 = 1e-30;

/// Apply preemphasis filter to audio signal.
///
/// Enhances high frequencies by applying: `y[i] = x[i] - coef * x[i-1]`
pub fn preemphasis(audio: &[f32], coef: f32) -> Vec<f32> {
    let Some(&first) = audio.first() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(audio.len());
    result.push(first);
    result.extend(audio.windows(2).map(|w| w[1] - coef * w[0]));
    result
}

/// Number of frames produced for `len` samples.
///
/// The last frame is zero padded, so any non-empty remainder yields a frame.
pub fn num_frames(len: usize, frame_len: usize, frame_step: usize) -> usize {
    if len <= frame_len {
        1
    } else {
        1 + (len - frame_len).div_ceil(frame_step)
    }
}

/// Split a signal into overlapping frames, `[nframe, frame_len]`.
pub fn frame_signal(signal: &[f32], frame_len: usize, frame_step: usize) -> Array2<f32> {
    let n = num_frames(signal.len(), frame_len, frame_step);

    Array2::from_shape_fn((n, frame_len), |(frame, i)| {
        signal.get(frame * frame_step + i).copied().unwrap_or(0.0)
    })
}

/// Power spectrum of each frame, `[nframe, nfft / 2 + 1]`.
///
/// Frames longer than `nfft` are truncated; shorter frames are zero padded.
pub fn power_spectrum(frames: &Array2<f32>, nfft: usize) -> Array2<f32> {
    let (num_frames, frame_len) = frames.dim();
    if frame_len > nfft {
        tracing::warn!(frame_len, nfft, "frame length is greater than FFT size, frame will be truncated");
    }

    let freq_bins = nfft / 2 + 1;
    let mut spectrum = Array2::<f32>::zeros((num_frames, freq_bins));

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(nfft);
    let mut buffer = vec![Complex::new(0.0, 0.0); nfft];

    for (frame, mut row) in frames.axis_iter(Axis(0)).zip(spectrum.axis_iter_mut(Axis(0))) {
        buffer.fill(Complex::new(0.0, 0.0));
        for (slot, &sample) in buffer.iter_mut().zip(frame.iter()) {
            *slot = Complex::new(sample, 0.0);
        }

        fft.process(&mut buffer);

        for (k, value) in row.iter_mut().enumerate() {
            *value = buffer[k].norm_sqr() / nfft as f32;
        }
    }

    spectrum
}

/// Power spectrogram of a waveform, `[nframe, nfft / 2 + 1]`.
///
/// Pre-emphasis, rectangular framing and `|rfft|² / nfft`.
pub fn powspec(samples: &[f32], params: &FeatParams) -> Result<Array2<f32>> {
    params.validate()?;

    let signal = preemphasis(samples, params.preemph);
    let frames = frame_signal(&signal, params.frame_len(), params.frame_step());

    Ok(power_spectrum(&frames, params.nfft))
}

/// Log power spectrogram in dB.
///
/// With `norm`, the maximum value is shifted to 0 dB.
pub fn logpowspec(powspec: &Array2<f32>, norm: bool) -> Result<Array2<f32>> {
    let log = powspec.mapv(|p| 10.0 * p.max(POWER_FLOOR).log10());

    if !norm {
        return Ok(log);
    }

    let max = *log.max()?;
    Ok(log.mapv(|x| x - max))
}

/// Frequency span in Hz covered by one FFT bin.
pub fn freq_resolution(sr: u32, nfft: usize) -> f32 {
    (sr as f32 / 2.0) / (nfft as f32 / 2.0)
}

/// Number of FFT bins spanning `freq` Hz at the given resolution.
pub fn points(freq: f32, resolution: f32) -> f32 {
    freq / resolution
}
