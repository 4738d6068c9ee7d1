use super::{BiLstm, MaskedEmbedding, PAD_ID, padding_mask};
use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use candle::{DType, Tensor};
use candle_nn::{Dropout, ModuleT, VarBuilder};

/// Embedding, dropout and a stack of BiLSTM layers.
pub struct SeqEncoder {
    embed: MaskedEmbedding,
    embed_dropout: Dropout,
    layers: Vec<BiLstm>,
    max_len: usize,
}

/// Encoder output with the mask that produced it.
pub struct Encoded {
    /// `[batch, time, 2 * num_units]`
    pub hidden: Tensor,
    /// `[batch, time]`, 1.0 at real tokens
    pub mask: Tensor,
}

impl SeqEncoder {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let s = config.structure();

        let embed = match config.pretrained_embedding()? {
            Some(path) => MaskedEmbedding::from_npy(path, config.vocab_size(), s.embedding_size, vb.device())?,
            None => MaskedEmbedding::new(config.vocab_size(), s.embedding_size, vb.pp("embedding"))?,
        };

        let mut in_dim = embed.dim();
        let mut layers = Vec::with_capacity(s.num_layers);
        for i in 0..s.num_layers.max(1) {
            let layer = BiLstm::new(in_dim, s.num_units, vb.pp("bilstm").pp(i))?;
            in_dim = layer.output_dim();
            layers.push(layer);
        }

        Ok(Self {
            embed,
            embed_dropout: Dropout::new(s.dropout_rate),
            layers,
            max_len: s.max_len,
        })
    }

    pub fn output_dim(&self) -> usize {
        self.layers
            .last()
            .map_or(self.embed.dim(), BiLstm::output_dim)
    }

    /// Encode right-padded `[batch, time]` token ids.
    pub fn forward(&self, input_x: &Tensor, train: bool) -> Result<Encoded> {
        let ids = input_x.to_dtype(DType::U32)?;
        let (_, time) = ids
            .dims2()
            .map_err(|_| ModelError::InputRank(input_x.dims().to_vec()))?;
        if time > self.max_len {
            return Err(ModelError::InputTooLong {
                len: time,
                max_len: self.max_len,
            }
            .into());
        }

        let lengths = sequence_lengths(&ids)?;
        let mask = padding_mask(&ids)?;

        let mut hidden = self.embed.forward(&ids)?;
        hidden = self.embed_dropout.forward_t(&hidden, train)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden, &lengths, &mask)?;
        }

        Ok(Encoded { hidden, mask })
    }
}

/// Position after the last non-padding token of each row.
fn sequence_lengths(ids: &Tensor) -> Result<Vec<usize>> {
    let rows = ids.to_vec2::<u32>()?;

    Ok(rows
        .iter()
        .map(|row| row.iter().rposition(|&id| id != PAD_ID).map_or(0, |i| i + 1))
        .collect())
}
