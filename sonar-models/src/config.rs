//! Model view of the YAML run configuration.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Keys a text model reads; unrelated sections are ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelConfig {
    pub data: DataSection,
    pub model: ModelSection,
}

impl ModelConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn structure(&self) -> &Structure {
        &self.model.net.structure
    }

    pub fn vocab_size(&self) -> usize {
        self.data.vocab_size
    }

    pub fn num_classes(&self) -> usize {
        self.data.task.num_classes
    }

    /// Path of the pretrained embedding matrix, when one is requested.
    pub fn pretrained_embedding(&self) -> Result<Option<&Path>> {
        if !self.model.use_pre_train_emb {
            return Ok(None);
        }

        self.model
            .embedding_path
            .as_deref()
            .map(Some)
            .ok_or_else(|| ConfigError::MissingEmbeddingPath.into())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DataSection {
    pub vocab_size: usize,
    pub task: TaskSection,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskSection {
    pub num_classes: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ModelSection {
    /// Registered model name, e.g. `BilstmCrfModel`
    pub name: String,
    #[serde(default)]
    pub use_pre_train_emb: bool,
    /// `.npy` matrix of shape `[vocab_size, embedding_size]`
    #[serde(default)]
    pub embedding_path: Option<PathBuf>,
    pub net: NetSection,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NetSection {
    pub structure: Structure,
}

/// Layer hyperparameters.
#[derive(Clone, Debug, Deserialize)]
pub struct Structure {
    pub embedding_size: usize,
    pub dropout_rate: f32,
    /// Stacked BiLSTM layers
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
    /// Hidden units per LSTM direction
    pub num_units: usize,
    /// Width of the fully-connected layer before the classifier
    pub fc_dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
    /// Weight decay used by an external trainer
    #[serde(default)]
    pub l2_reg_lambda: f64,
}

fn default_num_layers() -> usize {
    1
}
