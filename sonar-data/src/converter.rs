//! Batch converter: manifest entries in, aligned arrays plus lengths out.
//!
//! Payloads are only read from disk when a batch is converted.

use crate::config::{Config, TaskType};
use crate::error::{ConfigError, ConvertError, Result};
use crate::manifest::{Entry, IoInfo, Side};
use ndarray::{Array1, Array2, s};
use ndarray_npy::read_npy;

/// Numeric content of one stream.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Frame-level features, `[frames, dim]`
    Features(Array2<f32>),
    /// Token id sequence, `[length]`
    Tokens(Array1<i64>),
}

impl Payload {
    /// Leading dimension.
    pub fn len(&self) -> usize {
        match self {
            Payload::Features(x) => x.nrows(),
            Payload::Tokens(y) => y.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Features(_) => "features",
            Payload::Tokens(_) => "tokens",
        }
    }

    /// Keep every `factor`-th frame of a feature matrix.
    ///
    /// Token sequences are returned unchanged.
    pub fn subsample(self, factor: usize) -> Self {
        match self {
            Payload::Features(x) if factor > 1 => {
                Payload::Features(x.slice(s![..;factor, ..]).to_owned())
            }
            other => other,
        }
    }

    pub fn into_features(self) -> Result<Array2<f32>> {
        match self {
            Payload::Features(x) => Ok(x),
            other => Err(ConvertError::UnexpectedPayload {
                expected: "features",
                got: other.kind(),
            }
            .into()),
        }
    }

    pub fn into_tokens(self) -> Result<Array1<i64>> {
        match self {
            Payload::Tokens(y) => Ok(y),
            other => Err(ConvertError::UnexpectedPayload {
                expected: "tokens",
                got: other.kind(),
            }
            .into()),
        }
    }
}

/// Converted batch; all four vectors share one length.
#[derive(Clone, Debug)]
pub struct ConvertedBatch {
    pub xs: Vec<Payload>,
    pub ilens: Vec<usize>,
    pub ys: Vec<Payload>,
    pub olens: Vec<usize>,
}

impl ConvertedBatch {
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

/// Read the payload a stream descriptor points at.
///
/// Token ids win over a feature path when both are present.
pub fn load_payload(id: &str, info: &IoInfo) -> Result<Payload> {
    if let Some(tokenid) = &info.tokenid {
        let tokens = tokenid
            .split_whitespace()
            .map(|t| {
                t.parse::<i64>().map_err(|_| ConvertError::InvalidTokenId {
                    id: id.to_string(),
                    token: t.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        return Ok(Payload::Tokens(Array1::from(tokens)));
    }

    if let Some(path) = &info.feat {
        let feat: Array2<f32> = read_npy(path).map_err(|source| ConvertError::Npy {
            path: path.clone(),
            source,
        })?;
        return Ok(Payload::Features(feat));
    }

    Err(ConvertError::NoPayload { id: id.to_string() }.into())
}

/// Loads source and target payloads of a batch for one task direction.
#[derive(Clone, Copy, Debug)]
pub struct InputTargetLoader {
    task_type: TaskType,
}

impl InputTargetLoader {
    pub fn new(task_type: TaskType) -> Self {
        Self { task_type }
    }

    /// Sources and targets, in batch order.
    pub fn load(&self, batch: &[Entry]) -> Result<(Vec<Payload>, Vec<Payload>)> {
        let src_side = if self.task_type.swap_io() { Side::Output } else { Side::Input };

        batch
            .iter()
            .map(|(id, utt)| {
                let x = load_payload(id, utt.stream(id, src_side)?)?;
                let y = load_payload(id, utt.stream(id, src_side.other())?)?;
                Ok((x, y))
            })
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().unzip())
    }
}

/// Turns a minibatch into payloads plus per-example lengths.
#[derive(Clone, Debug)]
pub struct Converter {
    pub subsampling_factor: usize,
    loader: InputTargetLoader,
}

impl Converter {
    pub fn new(task_type: TaskType, subsampling_factor: usize) -> Self {
        Self {
            subsampling_factor,
            loader: InputTargetLoader::new(task_type),
        }
    }

    /// Converter for speech-to-text tasks, configured from `data.task.src`.
    pub fn asr(config: &Config) -> Result<Self> {
        let task = &config.data.task;
        if task.task_type != TaskType::Asr {
            return Err(ConfigError::TaskTypeMismatch {
                task: "AsrConverter",
                expected: TaskType::Asr.as_str(),
                got: task.task_type.as_str(),
            }
            .into());
        }

        Ok(Self::new(TaskType::Asr, task.src.subsampling_factor))
    }

    pub fn convert(&self, batch: &[Entry]) -> Result<ConvertedBatch> {
        let (xs, ys) = self.loader.load(batch)?;

        let xs: Vec<Payload> = xs
            .into_iter()
            .map(|x| x.subsample(self.subsampling_factor))
            .collect();

        let ilens = xs.iter().map(Payload::len).collect();
        let olens = ys.iter().map(Payload::len).collect();

        Ok(ConvertedBatch { xs, ilens, ys, olens })
    }
}
