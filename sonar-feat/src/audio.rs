//! Waveform loading.

use crate::error::{AudioError, Result};
use hound::{SampleFormat, WavReader, WavSpec};
use std::path::Path;

/// Default sample rate of the telephone-band corpora the toolkit targets.
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Load interleaved samples from a WAV file, scaled to [-1, 1].
///
/// Integer PCM of any bit depth is divided by its full-scale value; float
/// PCM is passed through.
///
/// # Errors
///
/// Returns error if file cannot be read or has unsupported format.
pub fn load_audio<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<_>>()?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<hound::Result<_>>()?
        }
    };

    Ok((samples, spec))
}

/// Load the first channel of a WAV file, asserting its sample rate.
///
/// # Errors
///
/// Returns error if:
/// - File cannot be read
/// - Sample rate differs from `sr`
/// - File has no channel
pub fn load_wav(path: impl AsRef<Path>, sr: u32) -> Result<Vec<f32>> {
    let path = path.as_ref();
    let (audio, spec) = load_audio(path)?;

    if spec.sample_rate != sr {
        return Err(AudioError::SampleRateMismatch {
            expected: sr,
            got: spec.sample_rate,
        }
        .into());
    }

    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::Empty(path.display().to_string()).into());
    }

    tracing::trace!(
        path = %path.display(),
        samples = audio.len() / channels,
        channels,
        "loaded wav"
    );

    if channels == 1 {
        return Ok(audio);
    }

    Ok(audio.chunks(channels).map(|frame| frame[0]).collect())
}
