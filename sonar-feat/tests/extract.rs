//! Integration tests for feature extraction.

use candle::Device;
use hound::{SampleFormat, WavSpec, WavWriter};
use ndarray::{Array2, Array3};
use ndarray_npy::read_npy;
use sonar_feat::error::{AudioError, Error};
use sonar_feat::extract::{extract_feat, extract_filterbank};
use sonar_feat::params::FeatParams;
use std::path::{Path, PathBuf};

fn write_wav(dir: &Path, name: &str, sample_rate: u32, len: usize) -> PathBuf {
    let path = dir.join(name);
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for i in 0..len {
        let x = 0.3 * (i as f32 * 0.13).sin() + 0.2 * (i as f32 * 0.71).sin();
        writer.write_sample((x * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

#[test]
fn same_wav_twice_gives_equal_features() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), "utt.wav", 8000, 6000);

    for feat_type in ["logfbank", "spectrogram"] {
        let params = FeatParams {
            feat_type: feat_type.to_string(),
            ..Default::default()
        };

        let first = extract_feat(&[&wav], &params).unwrap();
        let a: Array2<f32> = read_npy(&first[0]).unwrap();

        let second = extract_feat(&[&wav], &params).unwrap();
        let b: Array2<f32> = read_npy(&second[0]).unwrap();

        assert_eq!(a, b, "{feat_type} features differ between runs");
    }
}

#[test]
fn tensor_and_array_paths_agree() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), "utt.wav", 8000, 6000);
    let params = FeatParams::default();

    let outputs = extract_feat(&[&wav], &params).unwrap();
    let array_feat: Array2<f32> = read_npy(&outputs[0]).unwrap();

    let outputs = extract_filterbank(&[&wav], &params, &Device::Cpu).unwrap();
    let tensor_feat: Array3<f32> = read_npy(&outputs[0]).unwrap();

    assert_eq!(tensor_feat.dim().0, array_feat.nrows());
    assert_eq!(tensor_feat.dim().1, array_feat.ncols());
    for ((t, f, _), &x) in tensor_feat.indexed_iter() {
        assert!((x - array_feat[[t, f]]).abs() < 1e-3);
    }
}

#[test]
fn sample_rate_mismatch_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let wav = write_wav(dir.path(), "wide.wav", 16000, 1600);

    let result = extract_feat(&[&wav], &FeatParams::default());

    assert!(matches!(
        result,
        Err(Error::Audio(AudioError::SampleRateMismatch { .. }))
    ));
    assert!(!dir.path().join("wide.npy").exists());
}
