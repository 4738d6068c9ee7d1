//! Token embedding with index 0 reserved as padding.

use crate::error::{ModelError, Result};
use candle::{DType, Device, Module, Tensor};
use candle_nn::{Embedding, Init, VarBuilder};
use ndarray::Array2;
use ndarray_npy::read_npy;
use std::path::Path;

/// Padding token id; positions holding it are masked.
pub const PAD_ID: u32 = 0;

const INIT_RANGE: f64 = 0.1;

pub struct MaskedEmbedding {
    inner: Embedding,
    dim: usize,
}

impl MaskedEmbedding {
    /// Trainable table, uniform in `[-0.1, 0.1]` when freshly initialized.
    pub fn new(vocab_size: usize, dim: usize, vb: VarBuilder) -> Result<Self> {
        let init = Init::Uniform {
            lo: -INIT_RANGE,
            up: INIT_RANGE,
        };
        let weight = vb.get_with_hints((vocab_size, dim), "weight", init)?;

        Ok(Self {
            inner: Embedding::new(weight, dim),
            dim,
        })
    }

    /// Table read from a `[vocab_size, dim]` `.npy` matrix.
    pub fn from_npy(path: &Path, vocab_size: usize, dim: usize, device: &Device) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading pretrained embedding");

        let table: Array2<f32> = read_npy(path).map_err(|source| ModelError::Embedding {
            path: path.to_path_buf(),
            source,
        })?;
        if table.dim() != (vocab_size, dim) {
            return Err(ModelError::EmbeddingShape {
                expected: [vocab_size, dim],
                got: table.shape().to_vec(),
            }
            .into());
        }

        let values: Vec<f32> = table.iter().copied().collect();
        let weight = Tensor::from_vec(values, (vocab_size, dim), device)?;

        Ok(Self {
            inner: Embedding::new(weight, dim),
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// `[batch, time]` ids → `[batch, time, dim]`
    pub fn forward(&self, ids: &Tensor) -> Result<Tensor> {
        Ok(self.inner.forward(ids)?)
    }
}

/// 1.0 at real tokens, 0.0 at padding, `[batch, time]`.
pub fn padding_mask(ids: &Tensor) -> Result<Tensor> {
    Ok(ids.ne(PAD_ID)?.to_dtype(DType::F32)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;
    use ndarray_npy::write_npy;

    #[test]
    fn fresh_table_is_small() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

        let embed = MaskedEmbedding::new(20, 4, vb).unwrap();
        let ids = Tensor::new(&[[1u32, 2, 0]], &Device::Cpu).unwrap();
        let out = embed.forward(&ids).unwrap();

        assert_eq!(out.dims(), &[1, 3, 4]);
        let max = out.abs().unwrap().max_all().unwrap().to_scalar::<f32>().unwrap();
        assert!(max <= 0.1);
    }

    #[test]
    fn loads_pretrained_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emb.npy");
        let table = Array2::from_shape_fn((5, 3), |(i, j)| (i * 10 + j) as f32);
        write_npy(&path, &table).unwrap();

        let embed = MaskedEmbedding::from_npy(&path, 5, 3, &Device::Cpu).unwrap();
        let ids = Tensor::new(&[[4u32]], &Device::Cpu).unwrap();
        let out = embed.forward(&ids).unwrap().flatten_all().unwrap().to_vec1::<f32>().unwrap();

        assert_eq!(out, vec![40.0, 41.0, 42.0]);
    }

    #[test]
    fn rejects_wrong_table_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emb.npy");
        write_npy(&path, &Array2::<f32>::zeros((4, 3))).unwrap();

        assert!(MaskedEmbedding::from_npy(&path, 5, 3, &Device::Cpu).is_err());
    }

    #[test]
    fn masks_padding() {
        let ids = Tensor::new(&[[3u32, 1, 0, 0]], &Device::Cpu).unwrap();

        let mask = padding_mask(&ids).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(mask, vec![vec![1.0, 1.0, 0.0, 0.0]]);
    }
}
