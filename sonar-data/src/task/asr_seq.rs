//! Sequential speech recognition task.

use super::Task;
use crate::batchfy::{Batches, Minibatch, get_batches};
use crate::config::{Config, Mode};
use crate::converter::Converter;
use crate::dataset::{Dataset, Example, PaddedBatches, Sample, pad_batch};
use crate::error::{BatchError, Result};
use crate::manifest::{Entry, Side};
use crate::utils::seeded_rng;
use rand::seq::SliceRandom;

const DUMMY_FEAT_DIM: usize = 40;
const DUMMY_VOCAB_SIZE: usize = 100;
const DUMMY_TIME: usize = 10;

/// Item of [`AsrSeqTask::generate_data`].
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    /// Padded minibatch (batch mode)
    Batch(Example),
    /// One utterance
    Single(Sample),
}

/// Speech-to-token-sequence task over a batched manifest.
///
/// In dummy mode no manifest is read and every example is a constant tensor.
pub struct AsrSeqTask {
    config: Config,
    mode: Mode,
    batches: Vec<Minibatch>,
    n_utts: usize,
    feat_shape: Vec<usize>,
    vocab_size: usize,
    converter: Converter,
}

impl AsrSeqTask {
    pub fn new(config: Config, mode: Mode) -> Result<Self> {
        let converter = Converter::asr(&config)?;

        let (batches, n_utts, feat_shape, vocab_size) = if config.data.task.dummy {
            tracing::info!(feat_dim = DUMMY_FEAT_DIM, "dummy data");
            (Vec::new(), 0, vec![DUMMY_FEAT_DIM], DUMMY_VOCAB_SIZE)
        } else {
            let Batches { data, n_utts } = get_batches(&config, mode)?;
            let (id, utt) = data
                .first()
                .and_then(|batch| batch.first())
                .ok_or(BatchError::Empty)?;

            // [frames, feat...] and [length, vocab]
            let input = utt.stream(id, Side::Input)?;
            let feat_shape = input.shape.get(1..).unwrap_or_default().to_vec();
            let vocab_size = utt.dim_of(id, Side::Output)?;

            (data, n_utts, feat_shape, vocab_size)
        };

        tracing::info!(?feat_shape, vocab_size, utts = n_utts, "asr task ready");

        Ok(Self {
            config,
            mode,
            batches,
            n_utts,
            feat_shape,
            vocab_size,
            converter,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_dummy(&self) -> bool {
        self.config.data.task.dummy
    }

    /// Whether minibatches from batchfy are kept as-is.
    pub fn batch_mode(&self) -> bool {
        self.config.data.task.batch_mode
    }

    pub fn batches(&self) -> &[Minibatch] {
        &self.batches
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Convert one minibatch into per-utterance samples.
    fn samples(&self, batch: &[Entry]) -> Result<Vec<Sample>> {
        let converted = self.converter.convert(batch)?;

        converted
            .xs
            .into_iter()
            .zip(converted.ys)
            .zip(converted.ilens.into_iter().zip(converted.olens))
            .map(|((x, y), (ilen, olen))| {
                Ok(Sample {
                    feat: x.into_features()?,
                    input_length: ilen as i64,
                    target: y.into_tokens()?,
                    target_length: olen as i64,
                })
            })
            .collect()
    }

    /// Padded minibatches in batch mode, single utterances otherwise.
    pub fn generate_data(&self) -> impl Iterator<Item = Result<Record>> + '_ {
        self.batches.iter().flat_map(move |batch| match self.samples(batch) {
            Err(e) => vec![Err(e)],
            Ok(samples) if self.batch_mode() => vec![pad_batch(&samples).map(Record::Batch)],
            Ok(samples) => samples.into_iter().map(|s| Ok(Record::Single(s))).collect(),
        })
    }
}

impl Task for AsrSeqTask {
    fn name(&self) -> &'static str {
        "AsrSeqTask"
    }

    fn feat_shape(&self) -> &[usize] {
        &self.feat_shape
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn steps_per_epoch(&self) -> usize {
        if self.is_dummy() {
            return 1;
        }

        if self.batch_mode() {
            self.batches.len()
        } else {
            self.n_utts
                .checked_div(self.config.solver.optimizer.batch_size)
                .unwrap_or(0)
        }
    }

    /// In train mode the minibatch order is shuffled every epoch, as are the
    /// utterances within a minibatch when samples are re-batched. Re-batching
    /// drops the trailing partial batch in train mode only.
    fn dataset(&self, mode: Mode, batch_size: usize, epochs: usize) -> Result<Dataset<'_>> {
        let configured = self.config.solver.optimizer.batch_size;
        if batch_size != configured {
            tracing::warn!(batch_size, configured, "dataset batch size differs from config");
        }

        if self.is_dummy() {
            let examples = (0..epochs)
                .map(move |_| Ok(Example::constant(batch_size, DUMMY_TIME, DUMMY_FEAT_DIM)));
            return Ok(Dataset::new(examples));
        }

        let train = mode == Mode::Train;
        let mut rng = seeded_rng(self.config.data.task.seed);

        let order: Vec<usize> = (0..epochs)
            .flat_map(|_| {
                let mut indices: Vec<usize> = (0..self.batches.len()).collect();
                if train {
                    indices.shuffle(&mut rng);
                }
                indices
            })
            .collect();
        tracing::debug!(epochs, steps = order.len(), %mode, "dataset order");

        if self.batch_mode() {
            let examples = order
                .into_iter()
                .map(move |i| self.samples(&self.batches[i]).and_then(|s| pad_batch(&s)));
            return Ok(Dataset::new(examples));
        }

        let samples = order.into_iter().flat_map(move |i| match self.samples(&self.batches[i]) {
            Ok(mut samples) => {
                if train {
                    samples.shuffle(&mut rng);
                }
                samples.into_iter().map(Ok).collect::<Vec<_>>()
            }
            Err(e) => vec![Err(e)],
        });

        Ok(Dataset::new(PaddedBatches::new(samples, batch_size, train)))
    }
}
