//! Models registered by name.

use crate::config::ModelConfig;
use crate::error::{ConfigError, Error, Result};
use crate::models::{BilstmCrfModel, RnnClassModel};
use crate::traits::TextModel;
use candle::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use std::path::Path;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    BilstmCrf,
    RnnClass,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::BilstmCrf => "BilstmCrfModel",
            ModelKind::RnnClass => "RnnClassModel",
        }
    }

    pub fn build(self, config: &ModelConfig, vb: VarBuilder) -> Result<Box<dyn TextModel>> {
        Ok(match self {
            ModelKind::BilstmCrf => Box::new(BilstmCrfModel::new(config, vb)?),
            ModelKind::RnnClass => Box::new(RnnClassModel::new(config, vb)?),
        })
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BilstmCrfModel" => Ok(ModelKind::BilstmCrf),
            "RnnClassModel" => Ok(ModelKind::RnnClass),
            other => Err(ConfigError::UnknownModel(other.to_string()).into()),
        }
    }
}

/// Build the model named by `model.name` with weights from `vb`.
pub fn build_model(config: &ModelConfig, vb: VarBuilder) -> Result<Box<dyn TextModel>> {
    let kind: ModelKind = config.model.name.parse()?;
    tracing::info!(model = kind.as_str(), "building model");
    kind.build(config, vb)
}

/// Freshly initialized model with the [`VarMap`] owning its parameters.
pub fn init_model(config: &ModelConfig, device: &Device) -> Result<(Box<dyn TextModel>, VarMap)> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
    let model = build_model(config, vb)?;
    Ok((model, varmap))
}

/// Model with weights read from a safetensors file.
pub fn from_safetensors(config: &ModelConfig, path: impl AsRef<Path>, device: &Device) -> Result<Box<dyn TextModel>> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading weights");

    let tensors = candle::safetensors::load(path, device)?;
    let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
    build_model(config, vb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_names() {
        assert_eq!("BilstmCrfModel".parse::<ModelKind>().unwrap(), ModelKind::BilstmCrf);
        assert_eq!("RnnClassModel".parse::<ModelKind>().unwrap(), ModelKind::RnnClass);
    }

    #[test]
    fn unknown_model_is_a_config_error() {
        assert!(matches!(
            "TransformerModel".parse::<ModelKind>(),
            Err(Error::Config(ConfigError::UnknownModel(_)))
        ));
    }
}
