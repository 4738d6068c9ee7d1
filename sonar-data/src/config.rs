//! Typed view of the YAML run configuration.
//!
//! Only the keys the data pipeline reads are modelled here; other sections
//! (e.g. `model`) are ignored during deserialization. A missing required key
//! fails with the key name in the error message.

use crate::batchfy::{BatchCount, SortKey};
use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Dataset split a task is built for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
    Infer,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Train => "train",
            Mode::Eval => "eval",
            Mode::Infer => "infer",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task direction over a shared speech/text manifest.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// speech → text; manifest `input` is the source
    Asr,
    /// text → speech; manifest `output` is the source
    Tts,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Asr => "asr",
            TaskType::Tts => "tts",
        }
    }

    /// Whether manifest input/output roles are swapped.
    pub fn swap_io(&self) -> bool {
        matches!(self, TaskType::Tts)
    }
}

/// Top-level configuration consumed by the data pipeline.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub solver: SolverConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DataConfig {
    pub task: TaskConfig,
    #[serde(default)]
    pub train: Option<SplitConfig>,
    #[serde(default)]
    pub eval: Option<SplitConfig>,
    #[serde(default)]
    pub infer: Option<SplitConfig>,
}

impl DataConfig {
    /// Manifest paths configured for `mode`.
    pub fn paths(&self, mode: Mode) -> Result<&[PathBuf]> {
        let (split, key) = match mode {
            Mode::Train => (&self.train, "data.train.paths"),
            Mode::Eval => (&self.eval, "data.eval.paths"),
            Mode::Infer => (&self.infer, "data.infer.paths"),
        };

        split
            .as_ref()
            .map(|s| s.paths.as_slice())
            .ok_or_else(|| ConfigError::MissingKey(key).into())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SplitConfig {
    pub paths: Vec<PathBuf>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TaskConfig {
    /// Registered task name, e.g. `AsrSeqTask`
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub dummy: bool,
    pub batch_mode: bool,
    /// Shortest-first curriculum
    pub sortagrad: bool,
    pub batch_sort_key: SortKey,
    /// Truncate the batch list (debugging); 0 keeps all
    #[serde(default)]
    pub num_batches: usize,
    /// Seed for shuffling and min-batch filling
    #[serde(default)]
    pub seed: Option<u64>,
    pub src: StreamConfig,
    pub tgt: StreamConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StreamConfig {
    pub max_len: usize,
    #[serde(default = "default_subsampling_factor")]
    pub subsampling_factor: usize,
}

fn default_subsampling_factor() -> usize {
    1
}

#[derive(Clone, Debug, Deserialize)]
pub struct SolverConfig {
    /// Number of devices sharing the global batch
    #[serde(default)]
    pub num_gpus: usize,
    pub optimizer: OptimizerConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OptimizerConfig {
    /// Global batch size across all devices
    pub batch_size: usize,
    pub batch_bins: usize,
    pub batch_frames_in: usize,
    pub batch_frames_out: usize,
    pub batch_frames_inout: usize,
    pub batch_strategy: BatchCount,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;

    pub(crate) const CONFIG: &str = r#"
data:
  train:
    paths: [train.json]
  task:
    name: AsrSeqTask
    type: asr
    batch_mode: true
    sortagrad: false
    batch_sort_key: input
    src:
      max_len: 3000
      subsampling_factor: 1
    tgt:
      max_len: 100
solver:
  optimizer:
    batch_size: 4
    batch_bins: 0
    batch_frames_in: 0
    batch_frames_out: 0
    batch_frames_inout: 0
    batch_strategy: auto
model:
  name: ignored-by-data
"#;

    #[test]
    fn parses_config() {
        let config = Config::from_yaml(CONFIG).unwrap();

        assert_eq!(config.data.task.task_type, TaskType::Asr);
        assert_eq!(config.data.task.batch_sort_key, SortKey::Input);
        assert_eq!(config.solver.optimizer.batch_strategy, BatchCount::Auto);
        assert_eq!(config.solver.num_gpus, 0);
        assert_eq!(config.data.task.tgt.subsampling_factor, 1);
        assert_eq!(
            config.data.paths(Mode::Train).unwrap(),
            &[PathBuf::from("train.json")]
        );
    }

    #[test]
    fn missing_split_is_a_key_error() {
        let config = Config::from_yaml(CONFIG).unwrap();

        let err = config.data.paths(Mode::Eval).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingKey("data.eval.paths"))
        ));
    }

    #[test]
    fn missing_required_key_names_it() {
        let text = CONFIG.replace("    batch_size: 4\n", "");

        let err = Config::from_yaml(&text).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn rejects_unknown_task_type() {
        let text = CONFIG.replace("type: asr", "type: mt");

        assert!(matches!(
            Config::from_yaml(&text),
            Err(Error::Config(ConfigError::Parse(_)))
        ));
    }
}
