//! Filterbank features computed with candle tensors.
//!
//! Mirrors [`crate::fbank`] but runs the filterbank projection, log and delta
//! regression as tensor ops on a [`Device`], so the heavy part can live on an
//! accelerator. Outputs agree with the array path up to float rounding.

use crate::error::{ComputeError, Result};
use crate::fbank::{DELTA_WINDOW, ENERGY_FLOOR, mel_filterbank};
use crate::params::FeatParams;
use crate::spectrum::powspec;
use candle::{Device, Tensor};
use ndarray::{Array2, Array3};

/// Tensor-backed log-mel filterbank extractor.
pub struct TensorFbank {
    device: Device,
    params: FeatParams,
    /// `[nfft / 2 + 1, feature_size]`, pre-transposed for the projection
    filterbank_t: Tensor,
}

impl TensorFbank {
    pub fn new(params: FeatParams, device: &Device) -> Result<Self> {
        params.validate()?;

        let fb = mel_filterbank(
            params.feature_size,
            params.nfft,
            params.sr,
            params.lowfreq,
            params.highfreq_or_nyquist(),
        );
        let filterbank_t = array2_to_tensor(&fb, device)?.t()?.contiguous()?;

        Ok(Self {
            device: device.clone(),
            params,
            filterbank_t,
        })
    }

    /// Log-mel filterbank of a waveform, `[nframe, feature_size]`.
    pub fn process(&self, samples: &[f32]) -> Result<Tensor> {
        let spectrum = powspec(samples, &self.params)?;
        let x = array2_to_tensor(&spectrum, &self.device)?;

        let energies = x.matmul(&self.filterbank_t)?;
        let floor = energies.ones_like()?.affine(ENERGY_FLOOR as f64, 0.0)?;
        let energies = energies.eq(0f32)?.where_cond(&floor, &energies)?;

        Ok(energies.log()?)
    }
}

/// Regression delta along the frame axis (dim 0) with edge padding.
pub fn tensor_delta(feat: &Tensor, n: usize) -> Result<Tensor> {
    let num_frames = feat.dim(0)?;
    if num_frames == 0 || n == 0 {
        return Ok(feat.zeros_like()?);
    }

    let denominator = 2.0 * (1..=n).map(|i| (i * i) as f64).sum::<f64>();
    let last = num_frames as i64 - 1;
    let shifted = |offset: i64| -> Result<Tensor> {
        let idx: Vec<u32> = (0..num_frames as i64)
            .map(|t| (t + offset).clamp(0, last) as u32)
            .collect();
        let idx = Tensor::from_vec(idx, num_frames, feat.device())?;
        Ok(feat.index_select(&idx, 0)?)
    };

    let mut out = feat.zeros_like()?;
    for i in 1..=n as i64 {
        let diff = (shifted(i)? - shifted(-i)?)?;
        out = (out + diff.affine(i as f64 / denominator, 0.0)?)?;
    }

    Ok(out)
}

/// Append `order` successive deltas as channels.
///
/// Accepts `[nframe, nfilt]` or `[nframe, nfilt, 1]` and returns
/// `[nframe, nfilt, order + 1]`.
pub fn add_delta_delta(feat: &Tensor, order: usize) -> Result<Tensor> {
    let base = match feat.dims() {
        [_, _] => feat.clone(),
        [_, _, 1] => feat.squeeze(2)?,
        dims => {
            return Err(ComputeError::UnexpectedShape {
                expected: "[nframe, nfilt] or [nframe, nfilt, 1]",
                got: dims.to_vec(),
            }
            .into());
        }
    };

    let mut channels = vec![base];
    for _ in 0..order {
        let prev = channels.last().cloned().unwrap_or_else(|| feat.clone());
        channels.push(tensor_delta(&prev, DELTA_WINDOW)?);
    }

    Ok(Tensor::stack(&channels, 2)?)
}

pub(crate) fn array2_to_tensor(array: &Array2<f32>, device: &Device) -> Result<Tensor> {
    let shape = array.dim();
    let data: Vec<f32> = array.iter().copied().collect();
    Ok(Tensor::from_vec(data, shape, device)?)
}

#[cfg(test)]
pub(crate) fn tensor_to_array2(tensor: &Tensor) -> Result<Array2<f32>> {
    let (rows, cols) = tensor.dims2()?;
    let data = tensor.flatten_all()?.to_vec1::<f32>()?;
    Ok(Array2::from_shape_vec((rows, cols), data)?)
}

pub(crate) fn tensor_to_array3(tensor: &Tensor) -> Result<Array3<f32>> {
    let dims = tensor.dims3()?;
    let data = tensor.flatten_all()?.to_vec1::<f32>()?;
    Ok(Array3::from_shape_vec(dims, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fbank::{delta, delta_delta, logfbank};

    fn tone(len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.4 * (i as f32 * 0.21).sin() + 0.1 * (i as f32 * 1.7).cos())
            .collect()
    }

    fn max_abs_diff(a: &Array2<f32>, b: &Array2<f32>) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    #[test]
    fn matches_array_path() {
        let params = FeatParams::default();
        let samples = tone(6000);

        let expected = logfbank(&samples, &params).unwrap();
        let extractor = TensorFbank::new(params, &Device::Cpu).unwrap();
        let actual = tensor_to_array2(&extractor.process(&samples).unwrap()).unwrap();

        assert_eq!(actual.dim(), expected.dim());
        assert!(max_abs_diff(&actual, &expected) < 1e-3);
    }

    #[test]
    fn delta_matches_array_path() {
        let feat = Array2::from_shape_fn((12, 3), |(t, f)| ((t * 7 + f * 3) % 5) as f32);

        let expected = delta(feat.view(), 2);
        let x = array2_to_tensor(&feat, &Device::Cpu).unwrap();
        let actual = tensor_to_array2(&tensor_delta(&x, 2).unwrap()).unwrap();

        assert!(max_abs_diff(&actual, &expected) < 1e-5);
    }

    #[test]
    fn delta_delta_channels() {
        let feat = Array2::from_shape_fn((8, 4), |(t, f)| (t as f32).powi(2) + f as f32);
        let expected = delta_delta(&feat).unwrap();

        let x = array2_to_tensor(&feat, &Device::Cpu)
            .unwrap()
            .unsqueeze(2)
            .unwrap();
        let actual = tensor_to_array3(&add_delta_delta(&x, 2).unwrap()).unwrap();

        assert_eq!(actual.dim(), (8, 4, 3));
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-4);
        }
    }

    #[test]
    fn silence_matches_array_path() {
        let params = FeatParams::default();
        let silence = vec![0.0; 800];

        let expected = logfbank(&silence, &params).unwrap();
        let extractor = TensorFbank::new(params, &Device::Cpu).unwrap();
        let actual = tensor_to_array2(&extractor.process(&silence).unwrap()).unwrap();

        assert!(max_abs_diff(&actual, &expected) < 1e-3);
        assert!(actual.iter().all(|&x| x < -36.0));
    }

    #[test]
    fn rejects_multichannel_input() {
        let x = Tensor::zeros((4, 3, 2), candle::DType::F32, &Device::Cpu).unwrap();
        assert!(add_delta_delta(&x, 2).is_err());
    }
}
