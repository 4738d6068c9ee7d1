//! Text classifier: BiLSTM states mean-pooled over real tokens.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::layers::SeqEncoder;
use crate::traits::TextModel;
use candle::Tensor;
use candle_nn::{Dropout, Linear, Module, ModuleT, VarBuilder};

pub struct RnnClassModel {
    encoder: SeqEncoder,
    fc: Linear,
    dropout: Dropout,
    dense: Linear,
    num_classes: usize,
}

impl RnnClassModel {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let s = config.structure();
        let encoder = SeqEncoder::new(config, vb.clone())?;
        let num_classes = config.num_classes();

        let fc = candle_nn::linear(encoder.output_dim(), s.fc_dim, vb.pp("fc"))?;
        let dense = candle_nn::linear(s.fc_dim, num_classes, vb.pp("fc_layer"))?;

        tracing::info!(fc_dim = s.fc_dim, num_classes, "initialized RnnClassModel");

        Ok(Self {
            encoder,
            fc,
            dropout: Dropout::new(s.dropout_rate),
            dense,
            num_classes,
        })
    }
}

impl TextModel for RnnClassModel {
    fn name(&self) -> &'static str {
        "RnnClassModel"
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// `[batch, time]` → `[batch, num_classes]`
    fn forward(&self, input_x: &Tensor, train: bool) -> Result<Tensor> {
        let encoded = self.encoder.forward(input_x, train)?;

        // padded states are already zero
        let counts = encoded.mask.sum_keepdim(1)?.maximum(1f32)?;
        let pooled = encoded.hidden.sum(1)?.broadcast_div(&counts)?;

        let out = self.fc.forward(&pooled)?.relu()?;
        let out = self.dropout.forward_t(&out, train)?;
        Ok(self.dense.forward(&out)?)
    }
}
