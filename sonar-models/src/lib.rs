//! sonar-models: embedding and BiLSTM models for text classification and
//! sequence labeling, built on candle.
//!
//! Models implement [`traits::TextModel`] and are created by name through
//! [`registry::build_model`]. Token id 0 is padding; inputs are right-padded
//! `[batch, time]` id tensors.
//!
//! # Quick Start
//!
//! ```ignore
//! use candle::{Device, Tensor};
//! use sonar_models::config::ModelConfig;
//! use sonar_models::registry::init_model;
//!
//! let config = ModelConfig::from_file("demos/conf/bilstm-seq-label.yml")?;
//! let (model, _varmap) = init_model(&config, &Device::Cpu)?;
//! let ids = Tensor::new(&[[5u32, 8, 2, 0]], &Device::Cpu)?;
//! let logits = model.forward(&ids, false)?;
//! ```

pub mod config;
pub mod error;
pub mod layers;
pub mod models;
pub mod registry;
pub mod traits;
