//! Padded examples and the epoch iterator handed to a model.

use crate::error::{ConvertError, Result};
use ndarray::{Array1, Array2, Array3, s};

/// One utterance after conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// `[frames, dim]`
    pub feat: Array2<f32>,
    pub input_length: i64,
    /// `[length]`
    pub target: Array1<i64>,
    pub target_length: i64,
}

/// A zero-padded batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    /// `[batch, max_frames, dim]`
    pub inputs: Array3<f32>,
    pub input_length: Array1<i64>,
    /// `[batch, max_length]`
    pub targets: Array2<i64>,
    pub target_length: Array1<i64>,
}

impl Example {
    pub fn batch_size(&self) -> usize {
        self.input_length.len()
    }

    /// Placeholder CTC labels, one per example.
    pub fn ctc_labels(&self) -> Array1<f32> {
        Array1::ones(self.batch_size())
    }

    /// Constant-valued batch of the given shape.
    pub fn constant(batch_size: usize, time: usize, dim: usize) -> Self {
        Self {
            inputs: Array3::from_elem((batch_size, time, dim), 1.0),
            input_length: Array1::from_elem(batch_size, 2),
            targets: Array2::from_elem((batch_size, time), 3),
            target_length: Array1::from_elem(batch_size, 4),
        }
    }
}

/// Stack samples into one batch, padding frames and targets with zeros.
pub fn pad_batch(samples: &[Sample]) -> Result<Example> {
    let Some(first) = samples.first() else {
        return Ok(Example {
            inputs: Array3::zeros((0, 0, 0)),
            input_length: Array1::zeros(0),
            targets: Array2::zeros((0, 0)),
            target_length: Array1::zeros(0),
        });
    };

    let dim = first.feat.ncols();
    if let Some(bad) = samples.iter().find(|s| s.feat.ncols() != dim) {
        return Err(ConvertError::InconsistentDims(
            first.feat.shape().to_vec(),
            bad.feat.shape().to_vec(),
        )
        .into());
    }

    let imax = samples.iter().map(|s| s.feat.nrows()).max().unwrap_or(0);
    let omax = samples.iter().map(|s| s.target.len()).max().unwrap_or(0);

    let mut inputs = Array3::zeros((samples.len(), imax, dim));
    let mut targets = Array2::zeros((samples.len(), omax));
    for (i, sample) in samples.iter().enumerate() {
        inputs
            .slice_mut(s![i, ..sample.feat.nrows(), ..])
            .assign(&sample.feat);
        targets
            .slice_mut(s![i, ..sample.target.len()])
            .assign(&sample.target);
    }

    Ok(Example {
        inputs,
        input_length: samples.iter().map(|s| s.input_length).collect(),
        targets,
        target_length: samples.iter().map(|s| s.target_length).collect(),
    })
}

/// Groups a sample stream into padded batches of `batch_size`.
pub struct PaddedBatches<I> {
    inner: I,
    batch_size: usize,
    drop_remainder: bool,
}

impl<I> PaddedBatches<I> {
    pub fn new(inner: I, batch_size: usize, drop_remainder: bool) -> Self {
        Self {
            inner,
            batch_size: batch_size.max(1),
            drop_remainder,
        }
    }
}

impl<I> Iterator for PaddedBatches<I>
where
    I: Iterator<Item = Result<Sample>>,
{
    type Item = Result<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut samples = Vec::with_capacity(self.batch_size);
        while samples.len() < self.batch_size {
            match self.inner.next() {
                Some(Ok(sample)) => samples.push(sample),
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            }
        }

        let short = samples.len() < self.batch_size;
        if samples.is_empty() || (short && self.drop_remainder) {
            return None;
        }
        Some(pad_batch(&samples))
    }
}

/// Examples of all requested epochs, loaded lazily.
pub struct Dataset<'a> {
    inner: Box<dyn Iterator<Item = Result<Example>> + 'a>,
}

impl<'a> Dataset<'a> {
    pub fn new(inner: impl Iterator<Item = Result<Example>> + 'a) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl Iterator for Dataset<'_> {
    type Item = Result<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
