//! Bidirectional LSTM over right-padded batches.
//!
//! The backward direction reverses each row within its own length, so padding
//! never reaches a valid position in either direction.

use crate::error::Result;
use candle::{Device, Tensor};
use candle_nn::rnn::{LSTM, LSTMConfig, RNN};
use candle_nn::VarBuilder;

pub struct BiLstm {
    forward: LSTM,
    backward: LSTM,
    hidden: usize,
}

impl BiLstm {
    pub fn new(in_dim: usize, hidden: usize, vb: VarBuilder) -> Result<Self> {
        let forward = candle_nn::lstm(in_dim, hidden, LSTMConfig::default(), vb.pp("forward"))?;
        let backward = candle_nn::lstm(in_dim, hidden, LSTMConfig::default(), vb.pp("backward"))?;

        Ok(Self {
            forward,
            backward,
            hidden,
        })
    }

    /// Forward and backward states concatenated.
    pub fn output_dim(&self) -> usize {
        2 * self.hidden
    }

    /// `[batch, time, in_dim]` → `[batch, time, 2 * hidden]`, zero where `mask` is 0.
    pub fn forward(&self, xs: &Tensor, lengths: &[usize], mask: &Tensor) -> Result<Tensor> {
        let (_, time, _) = xs.dims3()?;

        let fwd = run(&self.forward, xs)?;

        let reverse = reverse_index(lengths, time, xs.device())?;
        let bwd = run(&self.backward, &gather_time(xs, &reverse)?)?;
        let bwd = gather_time(&bwd, &reverse)?;

        let out = Tensor::cat(&[&fwd, &bwd], 2)?;
        Ok(out.broadcast_mul(&mask.unsqueeze(2)?)?)
    }
}

fn run(lstm: &LSTM, xs: &Tensor) -> Result<Tensor> {
    let states = lstm.seq(xs)?;
    Ok(lstm.states_to_tensor(&states)?)
}

/// Per-row time permutation reversing the first `len` steps; padding stays put.
///
/// The permutation is its own inverse.
fn reverse_index(lengths: &[usize], time: usize, device: &Device) -> Result<Tensor> {
    let index: Vec<u32> = lengths
        .iter()
        .flat_map(|&len| {
            let len = len.min(time);
            (0..time).map(move |t| if t < len { (len - 1 - t) as u32 } else { t as u32 })
        })
        .collect();

    Ok(Tensor::from_vec(index, (lengths.len(), time), device)?)
}

/// Reorder the time axis of `[batch, time, dim]` by a `[batch, time]` index.
fn gather_time(xs: &Tensor, index: &Tensor) -> Result<Tensor> {
    let (batch, time, dim) = xs.dims3()?;
    let index = index
        .unsqueeze(2)?
        .broadcast_as((batch, time, dim))?
        .contiguous()?;

    Ok(xs.contiguous()?.gather(&index, 1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle::DType;
    use candle_nn::VarMap;

    #[test]
    fn reverses_within_length() {
        let index = reverse_index(&[3, 1], 4, &Device::Cpu).unwrap();

        assert_eq!(
            index.to_vec2::<u32>().unwrap(),
            vec![vec![2, 1, 0, 3], vec![0, 1, 2, 3]]
        );
    }

    #[test]
    fn gathers_along_time() {
        let xs = Tensor::arange(0f32, 8., &Device::Cpu)
            .unwrap()
            .reshape((1, 4, 2))
            .unwrap();
        let index = reverse_index(&[4], 4, &Device::Cpu).unwrap();

        let out = gather_time(&xs, &index).unwrap().to_vec3::<f32>().unwrap();
        assert_eq!(
            out[0],
            vec![vec![6., 7.], vec![4., 5.], vec![2., 3.], vec![0., 1.]]
        );
    }

    #[test]
    fn padding_does_not_leak() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let lstm = BiLstm::new(3, 5, vb).unwrap();

        let short = Tensor::rand(-1f32, 1., (1, 3, 3), &Device::Cpu).unwrap();
        let noise = Tensor::rand(-1f32, 1., (1, 2, 3), &Device::Cpu).unwrap();
        let long = Tensor::cat(&[&short, &noise], 1).unwrap();

        let short_mask = Tensor::ones((1, 3), DType::F32, &Device::Cpu).unwrap();
        let long_mask = Tensor::new(&[[1f32, 1., 1., 0., 0.]], &Device::Cpu).unwrap();

        let a = lstm.forward(&short, &[3], &short_mask).unwrap();
        let b = lstm.forward(&long, &[3], &long_mask).unwrap();

        assert_eq!(b.dims(), &[1, 5, 10]);
        let diff = (a - b.narrow(1, 0, 3).unwrap())
            .unwrap()
            .abs()
            .unwrap()
            .max_all()
            .unwrap()
            .to_scalar::<f32>()
            .unwrap();
        assert!(diff < 1e-5);

        let tail = b.narrow(1, 3, 2).unwrap().abs().unwrap().sum_all().unwrap();
        assert_eq!(tail.to_scalar::<f32>().unwrap(), 0.0);
    }
}
