//! Per-token tagger: BiLSTM emissions for a downstream CRF decoder.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::layers::SeqEncoder;
use crate::traits::TextModel;
use candle::Tensor;
use candle_nn::{Dropout, Linear, Module, ModuleT, VarBuilder};

pub struct BilstmCrfModel {
    encoder: SeqEncoder,
    dropout: Dropout,
    dense: Linear,
    num_classes: usize,
}

impl BilstmCrfModel {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let encoder = SeqEncoder::new(config, vb.clone())?;
        let num_classes = config.num_classes();
        let dense = candle_nn::linear(encoder.output_dim(), num_classes, vb.pp("fc_layer"))?;

        tracing::info!(
            num_layers = config.structure().num_layers,
            num_units = config.structure().num_units,
            num_classes,
            "initialized BilstmCrfModel"
        );

        Ok(Self {
            encoder,
            dropout: Dropout::new(config.structure().dropout_rate),
            dense,
            num_classes,
        })
    }
}

impl TextModel for BilstmCrfModel {
    fn name(&self) -> &'static str {
        "BilstmCrfModel"
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// `[batch, time]` → `[batch, time, num_classes]`
    fn forward(&self, input_x: &Tensor, train: bool) -> Result<Tensor> {
        let encoded = self.encoder.forward(input_x, train)?;
        let out = self.dropout.forward_t(&encoded.hidden, train)?;
        Ok(self.dense.forward(&out)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::CONFIG;
    use candle::{DType, Device};
    use candle_nn::VarMap;

    fn model() -> BilstmCrfModel {
        let config = ModelConfig::from_yaml(CONFIG).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        BilstmCrfModel::new(&config, vb).unwrap()
    }

    #[test]
    fn emits_per_token_logits() {
        let ids = Tensor::new(&[[3u32, 9, 4, 0], [7, 2, 0, 0]], &Device::Cpu).unwrap();

        let logits = model().forward(&ids, false).unwrap();
        assert_eq!(logits.dims(), &[2, 4, 5]);
    }

    #[test]
    fn rejects_input_over_max_len() {
        let ids = Tensor::ones((1, 13), DType::U32, &Device::Cpu).unwrap();

        assert!(model().forward(&ids, false).is_err());
    }
}
