//! Tasks registered by name.

mod asr_seq;

pub use asr_seq::{AsrSeqTask, Record};

use crate::config::{Config, Mode};
use crate::dataset::Dataset;
use crate::error::{ConfigError, Error, Result};
use std::str::FromStr;

/// Dataset-producing task.
pub trait Task {
    /// Registered name
    fn name(&self) -> &'static str;

    /// Per-frame feature shape
    fn feat_shape(&self) -> &[usize];

    /// Output vocabulary size
    fn vocab_size(&self) -> usize;

    fn steps_per_epoch(&self) -> usize;

    /// Padded examples for `epochs` passes over the data.
    fn dataset(&self, mode: Mode, batch_size: usize, epochs: usize) -> Result<Dataset<'_>>;
}

/// Task registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    AsrSeq,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::AsrSeq => "AsrSeqTask",
        }
    }

    pub fn build(self, config: Config, mode: Mode) -> Result<Box<dyn Task>> {
        match self {
            TaskKind::AsrSeq => Ok(Box::new(AsrSeqTask::new(config, mode)?)),
        }
    }
}

impl FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AsrSeqTask" => Ok(TaskKind::AsrSeq),
            other => Err(ConfigError::UnknownTask(other.to_string()).into()),
        }
    }
}

/// Build the task named by `data.task.name`.
pub fn build_task(config: Config, mode: Mode) -> Result<Box<dyn Task>> {
    let kind: TaskKind = config.data.task.name.parse()?;
    tracing::info!(task = kind.as_str(), %mode, "building task");
    kind.build(config, mode)
}
