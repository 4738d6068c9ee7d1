//! Minibatch construction over manifest entries.
//!
//! Entries are grouped by one of four strategies:
//!
//! - `seq`: at most `batch_size` sequences, shrunk for long utterances
//! - `bin`: at most `batch_bins` bins (frames × dim) of padded input + output
//! - `frame`: input, output and input+output frame budgets
//! - `auto`: the first strategy whose budget is non-zero, in the order above
//!
//! Utterances tagged with different `category` values never share a batch.

use crate::config::{Config, Mode, TaskType};
use crate::error::{BatchError, ConfigError, Result};
use crate::manifest::{Entry, Manifest, Side};
use crate::utils::{per_device_batch_size, seeded_rng};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::HashMap;

/// One minibatch of manifest entries.
pub type Minibatch = Vec<Entry>;

/// Strategy counting the size of a minibatch.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchCount {
    #[default]
    Auto,
    Seq,
    Bin,
    Frame,
}

/// Ordering applied before grouping.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// By input length
    #[default]
    Input,
    /// By output length
    Output,
    /// Random order (only with `seq`)
    Shuffle,
}

/// Budgets and ordering for [`make_batchset`].
#[derive(Clone, Debug)]
pub struct BatchParams {
    /// Maximum number of sequences (`seq`)
    pub batch_size: usize,
    /// Input length above which `seq` batches shrink; 0 disables
    pub max_length_in: usize,
    /// Output length above which `seq` batches shrink; 0 disables
    pub max_length_out: usize,
    /// Keep only the first batches (debugging); 0 keeps all
    pub num_batches: usize,
    pub batch_sort_key: SortKey,
    /// Minimum batch size, e.g. the device count
    pub min_batch_size: usize,
    /// Ascending length order, also reverses entries inside each batch
    pub shortest_first: bool,
    /// Maximum bins (`bin`)
    pub batch_bins: usize,
    /// Maximum padded input frames (`frame`); 0 disables
    pub batch_frames_in: usize,
    /// Maximum padded output frames (`frame`); 0 disables
    pub batch_frames_out: usize,
    /// Maximum padded input + output frames (`frame`); 0 disables
    pub batch_frames_inout: usize,
    pub count: BatchCount,
    /// Seed of the shuffle and min-batch filling; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            batch_size: 0,
            max_length_in: 0,
            max_length_out: 0,
            num_batches: 0,
            batch_sort_key: SortKey::Input,
            min_batch_size: 1,
            shortest_first: false,
            batch_bins: 0,
            batch_frames_in: 0,
            batch_frames_out: 0,
            batch_frames_inout: 0,
            count: BatchCount::Auto,
            seed: None,
        }
    }
}

impl BatchParams {
    /// Resolve `auto` to the first strategy with an enabled budget.
    pub fn resolve_count(&self) -> Result<BatchCount> {
        if self.count != BatchCount::Auto {
            return Ok(self.count);
        }

        let count = if self.batch_size != 0 {
            BatchCount::Seq
        } else if self.batch_bins != 0 {
            BatchCount::Bin
        } else if self.batch_frames_in != 0
            || self.batch_frames_out != 0
            || self.batch_frames_inout != 0
        {
            BatchCount::Frame
        } else {
            return Err(BatchError::InvalidBudget(
                "cannot detect batch strategy: batch_size, batch_bins and batch_frames_* are all 0",
            )
            .into());
        };

        tracing::info!(?count, "batch strategy auto detected");
        Ok(count)
    }

    fn rng(&self) -> StdRng {
        seeded_rng(self.seed)
    }
}

/// Input/output roles of the manifest streams.
#[derive(Clone, Copy, Debug)]
struct Keys {
    ikey: Side,
    okey: Side,
}

/// Group manifest entries into minibatches.
///
/// TTS swaps the roles of the manifest `input` and `output` streams, including
/// the sort key.
pub fn make_batchset(task_type: TaskType, data: &Manifest, params: &BatchParams) -> Result<Vec<Minibatch>> {
    if data.is_empty() {
        return Err(BatchError::Empty.into());
    }

    let count = params.resolve_count()?;
    if count != BatchCount::Seq && params.batch_sort_key == SortKey::Shuffle {
        return Err(BatchError::ShuffleRequiresSeq.into());
    }

    let (keys, sort_key) = if task_type.swap_io() {
        let sort_key = match params.batch_sort_key {
            SortKey::Input => SortKey::Output,
            SortKey::Output => SortKey::Input,
            SortKey::Shuffle => SortKey::Shuffle,
        };
        (Keys { ikey: Side::Output, okey: Side::Input }, sort_key)
    } else {
        (Keys { ikey: Side::Input, okey: Side::Output }, params.batch_sort_key)
    };

    // categories in order of first appearance over the id-sorted manifest
    let mut categories: Vec<Vec<Entry>> = Vec::new();
    let mut slots: HashMap<Option<&str>, usize> = HashMap::new();
    for (id, utt) in &data.utts {
        let slot = *slots.entry(utt.category.as_deref()).or_insert_with(|| {
            categories.push(Vec::new());
            categories.len() - 1
        });
        categories[slot].push((id.clone(), utt.clone()));
    }

    let mut rng = params.rng();
    let mut batches = Vec::new();

    for entries in categories {
        if entries.len() < params.min_batch_size {
            return Err(BatchError::TooFewUtterances {
                utts: entries.len(),
                min_batch_size: params.min_batch_size,
            }
            .into());
        }

        let category_batches = match sort_key {
            SortKey::Shuffle => batchfy_shuffle(entries, params, &mut rng)?,
            SortKey::Input | SortKey::Output => {
                let side = if sort_key == SortKey::Input { Side::Input } else { Side::Output };
                let sorted = sort_entries(entries, side, params.shortest_first)?;
                tracing::debug!(utts = sorted.len(), "sorted utterances");

                match count {
                    BatchCount::Seq => batchfy_by_seq(sorted, params, keys, &mut rng)?,
                    BatchCount::Bin => batchfy_by_bin(sorted, params, keys)?,
                    BatchCount::Frame => batchfy_by_frame(sorted, params, keys)?,
                    BatchCount::Auto => unreachable!("count resolved above"),
                }
            }
        };

        batches.extend(category_batches);
    }

    if params.num_batches > 0 {
        batches.truncate(params.num_batches);
    }

    tracing::info!(minibatches = batches.len(), "made batchset");
    Ok(batches)
}

/// Sort by the length of `side`, longest first unless `shortest_first`.
///
/// Stable: equal lengths keep id order.
fn sort_entries(entries: Vec<Entry>, side: Side, shortest_first: bool) -> Result<Vec<Entry>> {
    let mut keyed = entries
        .into_iter()
        .map(|(id, utt)| Ok((utt.len_of(&id, side)?, (id, utt))))
        .collect::<Result<Vec<_>>>()?;

    if shortest_first {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    } else {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    }

    Ok(keyed.into_iter().map(|(_, entry)| entry).collect())
}

/// Pad a short batch up to `min_batch_size` with random entries before `start`.
fn fill_short_batch(
    minibatch: &mut Minibatch,
    sorted: &[Entry],
    start: usize,
    params: &BatchParams,
    rng: &mut StdRng,
) {
    let min = params.min_batch_size;
    if minibatch.len() >= min || start == 0 {
        return;
    }

    let missing = min - minibatch.len() % min;
    let mut additional: Minibatch = (0..missing)
        .map(|_| sorted[rng.gen_range(0..start)].clone())
        .collect();
    if params.shortest_first {
        additional.reverse();
    }
    minibatch.extend(additional);
}

/// Sequence-count batching with length-adaptive batch size.
fn batchfy_by_seq(
    sorted: Vec<Entry>,
    params: &BatchParams,
    keys: Keys,
    rng: &mut StdRng,
) -> Result<Vec<Minibatch>> {
    if params.batch_size == 0 {
        return Err(BatchError::InvalidBudget("batch_size must be positive").into());
    }

    let ratio = |len: usize, max: usize| if max == 0 { 0 } else { len / max };

    let mut minibatches = Vec::new();
    let mut start = 0;
    loop {
        let (id, utt) = &sorted[start];
        let ilen = utt.len_of(id, keys.ikey)?;
        let olen = utt.len_of(id, keys.okey)?;

        // ilen = 1000 with max_length_in = 800 halves the batch
        let factor = ratio(ilen, params.max_length_in).max(ratio(olen, params.max_length_out));
        let bs = params.min_batch_size.max(params.batch_size / (1 + factor));
        let end = sorted.len().min(start + bs);

        let mut minibatch = sorted[start..end].to_vec();
        if params.shortest_first {
            minibatch.reverse();
        }
        fill_short_batch(&mut minibatch, &sorted, start, params, rng);
        minibatches.push(minibatch);

        if end == sorted.len() {
            break;
        }
        start = end;
    }

    Ok(minibatches)
}

/// Move entries from earlier batches into a trailing batch smaller than `min`.
///
/// When the first batch ends up short it is merged into the second.
fn fix_min_batch_size(minibatches: &mut Vec<Minibatch>, min: usize) {
    let Some(mut i) = minibatches.len().checked_sub(1) else {
        return;
    };

    while minibatches[i].len() < min {
        let missing = min - minibatches[i].len();

        if i == 0 {
            if minibatches.len() > 1 {
                let first = minibatches.remove(0);
                minibatches[0].extend(first);
            }
            break;
        }

        let prev = &mut minibatches[i - 1];
        let borrowed: Minibatch = prev.drain(..missing.min(prev.len())).collect();
        minibatches[i].extend(borrowed);
        i -= 1;
    }
}

/// Bin-count batching: padded `(input + output) × batch` bins under `batch_bins`.
fn batchfy_by_bin(sorted: Vec<Entry>, params: &BatchParams, keys: Keys) -> Result<Vec<Minibatch>> {
    if params.batch_bins == 0 {
        return Err(BatchError::InvalidBudget("batch_bins must be positive").into());
    }

    let length = sorted.len();
    let (first_id, first) = &sorted[0];
    let idim = first.dim_of(first_id, keys.ikey)?;
    let odim = first.dim_of(first_id, keys.okey)?;

    let mut minibatches: Vec<Minibatch> = Vec::new();
    let mut start = 0;
    loop {
        let mut b = 0;
        let mut next_size = 0;
        let mut max_olen = 0;

        while next_size < params.batch_bins && start + b < length {
            let (id, utt) = &sorted[start + b];
            let ilen = utt.len_of(id, keys.ikey)? * idim;
            let olen = utt.len_of(id, keys.okey)? * odim;
            max_olen = max_olen.max(olen);

            next_size = (max_olen + ilen) * (b + 1);
            if next_size <= params.batch_bins {
                b += 1;
            } else if next_size == 0 {
                return Err(BatchError::InvalidBudget("utterance with zero bins").into());
            }
        }

        let end = length.min(start + params.min_batch_size.max(b));
        let mut batch = sorted[start..end].to_vec();
        if params.shortest_first {
            batch.reverse();
        }
        minibatches.push(batch);
        fix_min_batch_size(&mut minibatches, params.min_batch_size);

        if end == length {
            break;
        }
        start = end;
    }

    log_batch_sizes(&minibatches);
    Ok(minibatches)
}

/// Frame-count batching under input, output and input+output budgets.
fn batchfy_by_frame(sorted: Vec<Entry>, params: &BatchParams, keys: Keys) -> Result<Vec<Minibatch>> {
    let (max_in, max_out, max_inout) = (
        params.batch_frames_in,
        params.batch_frames_out,
        params.batch_frames_inout,
    );
    if max_in == 0 && max_out == 0 && max_inout == 0 {
        return Err(BatchError::InvalidBudget("one of batch_frames_in/out/inout must be positive").into());
    }

    let exceeds = |id: &str, what: &'static str, len: usize, budget: usize| -> Result<()> {
        if budget != 0 && len > budget {
            return Err(BatchError::ExceedsBudget {
                id: id.to_string(),
                what,
                len,
                budget,
            }
            .into());
        }
        Ok(())
    };
    let within = |len: usize, budget: usize| budget == 0 || len <= budget;

    let length = sorted.len();
    let mut minibatches: Vec<Minibatch> = Vec::new();
    let mut start = 0;
    let mut end = 0;

    while end != length {
        let mut b = 0;
        let mut max_ilen = 0;
        let mut max_olen = 0;

        while start + b < length {
            let (id, utt) = &sorted[start + b];
            let ilen = utt.len_of(id, keys.ikey)?;
            let olen = utt.len_of(id, keys.okey)?;
            exceeds(id, "input", ilen, max_in)?;
            exceeds(id, "output", olen, max_out)?;
            exceeds(id, "input+output", ilen + olen, max_inout)?;

            max_ilen = max_ilen.max(ilen);
            max_olen = max_olen.max(olen);

            let in_ok = within(max_ilen * (b + 1), max_in);
            let out_ok = within(max_olen * (b + 1), max_out);
            let inout_ok = within((max_ilen + max_olen) * (b + 1), max_inout);
            if !(in_ok && out_ok && inout_ok) {
                break;
            }
            b += 1;
        }

        end = length.min(start + b);
        let mut batch = sorted[start..end].to_vec();
        if params.shortest_first {
            batch.reverse();
        }
        minibatches.push(batch);
        fix_min_batch_size(&mut minibatches, params.min_batch_size);
        start = end;
    }

    log_batch_sizes(&minibatches);
    Ok(minibatches)
}

/// Fixed-size batches over a random permutation.
fn batchfy_shuffle(mut entries: Vec<Entry>, params: &BatchParams, rng: &mut StdRng) -> Result<Vec<Minibatch>> {
    if params.batch_size == 0 {
        return Err(BatchError::InvalidBudget("batch_size must be positive").into());
    }

    tracing::info!("use shuffled batch");
    entries.shuffle(rng);

    let mut minibatches = Vec::new();
    let mut start = 0;
    loop {
        let end = entries.len().min(start + params.batch_size);
        let mut minibatch = entries[start..end].to_vec();
        if params.shortest_first {
            minibatch.reverse();
        }
        fill_short_batch(&mut minibatch, &entries, start, params, rng);
        minibatches.push(minibatch);

        if end == entries.len() {
            break;
        }
        start = end;
    }

    Ok(minibatches)
}

/// Minibatches of one split with the utterance count they were built from.
#[derive(Clone, Debug)]
pub struct Batches {
    pub data: Vec<Minibatch>,
    pub n_utts: usize,
}

/// Load the manifest of `mode` and group it as configured.
///
/// The task direction decides which stream's `max_len` bounds the input.
/// The global batch size is split across `solver.num_gpus`, which is also the
/// minimum batch size.
pub fn get_batches(config: &Config, mode: Mode) -> Result<Batches> {
    let paths = config.data.paths(mode)?;
    let [path] = paths else {
        return Err(ConfigError::ManifestPathCount {
            mode: mode.as_str(),
            got: paths.len(),
        }
        .into());
    };

    let data = Manifest::from_file(path)?;
    let n_utts = data.len();
    tracing::info!(utts = n_utts, %mode, "load json data");

    let task = &config.data.task;
    let (src, tgt) = match task.task_type {
        TaskType::Asr => (&task.src, &task.tgt),
        TaskType::Tts => (&task.tgt, &task.src),
    };

    let optimizer = &config.solver.optimizer;
    let num_gpus = config.solver.num_gpus;

    let params = BatchParams {
        batch_size: per_device_batch_size(optimizer.batch_size, num_gpus)?,
        max_length_in: src.max_len,
        max_length_out: tgt.max_len,
        num_batches: task.num_batches,
        batch_sort_key: task.batch_sort_key,
        min_batch_size: num_gpus.max(1),
        shortest_first: task.sortagrad,
        batch_bins: optimizer.batch_bins,
        batch_frames_in: optimizer.batch_frames_in,
        batch_frames_out: optimizer.batch_frames_out,
        batch_frames_inout: optimizer.batch_frames_inout,
        count: optimizer.batch_strategy,
        seed: task.seed,
    };

    let data = make_batchset(task.task_type, &data, &params)?;
    Ok(Batches { data, n_utts })
}

fn log_batch_sizes(minibatches: &[Minibatch]) {
    let sizes = minibatches.iter().map(Vec::len);
    let (min, max) = sizes.fold((usize::MAX, 0), |(lo, hi), n| (lo.min(n), hi.max(n)));
    tracing::debug!(count = minibatches.len(), min, max, "batch sizes");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{IoInfo, Utterance};

    fn utt(ilen: usize, olen: usize) -> Utterance {
        Utterance {
            input: vec![IoInfo {
                shape: vec![ilen, 2],
                ..Default::default()
            }],
            output: vec![IoInfo {
                shape: vec![olen, 3],
                ..Default::default()
            }],
            category: None,
        }
    }

    fn manifest(lens: &[(usize, usize)]) -> Manifest {
        let mut data = Manifest::default();
        for (i, &(ilen, olen)) in lens.iter().enumerate() {
            data.utts.insert(format!("utt{i:02}"), utt(ilen, olen));
        }
        data
    }

    fn ids(batch: &Minibatch) -> Vec<&str> {
        batch.iter().map(|(id, _)| id.as_str()).collect()
    }

    fn total(batches: &[Minibatch]) -> usize {
        batches.iter().map(Vec::len).sum()
    }

    #[test]
    fn auto_detects_strategy() {
        let seq = BatchParams {
            batch_size: 4,
            batch_bins: 100,
            ..Default::default()
        };
        assert_eq!(seq.resolve_count().unwrap(), BatchCount::Seq);

        let bin = BatchParams {
            batch_bins: 100,
            ..Default::default()
        };
        assert_eq!(bin.resolve_count().unwrap(), BatchCount::Bin);

        let frame = BatchParams {
            batch_frames_inout: 100,
            ..Default::default()
        };
        assert_eq!(frame.resolve_count().unwrap(), BatchCount::Frame);

        assert!(BatchParams::default().resolve_count().is_err());
    }

    #[test]
    fn seq_sorts_longest_first() {
        let data = manifest(&[(10, 1), (30, 1), (20, 1), (40, 1), (50, 1)]);
        let params = BatchParams {
            batch_size: 2,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        assert_eq!(batches.len(), 3);
        assert_eq!(ids(&batches[0]), vec!["utt04", "utt03"]);
        assert_eq!(ids(&batches[1]), vec!["utt01", "utt02"]);
        assert_eq!(ids(&batches[2]), vec!["utt00"]);
    }

    #[test]
    fn seq_shortest_first_reverses_within_batch() {
        let data = manifest(&[(10, 1), (30, 1), (20, 1), (40, 1)]);
        let params = BatchParams {
            batch_size: 2,
            shortest_first: true,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        assert_eq!(ids(&batches[0]), vec!["utt02", "utt00"]);
        assert_eq!(ids(&batches[1]), vec!["utt03", "utt01"]);
    }

    #[test]
    fn seq_shrinks_for_long_inputs() {
        let data = manifest(&[(1000, 1), (1000, 1), (1000, 1), (10, 1)]);
        let params = BatchParams {
            batch_size: 4,
            max_length_in: 500,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        // factor 2 → 4 / 3 = 1 per batch for the long ones
        assert_eq!(batches[0].len(), 1);
        assert_eq!(total(&batches), 4);
    }

    #[test]
    fn seq_fills_up_to_min_batch_size() {
        let data = manifest(&[(10, 1), (20, 1), (30, 1), (40, 1), (50, 1)]);
        let params = BatchParams {
            batch_size: 2,
            min_batch_size: 2,
            seed: Some(7),
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        assert!(batches.iter().all(|b| b.len() >= 2));
        assert_eq!(total(&batches), 6);
    }

    #[test]
    fn bin_respects_budget() {
        // idim 2, odim 3: (olen*3 + ilen*2) * b
        let data = manifest(&[(10, 2), (10, 2), (10, 2), (10, 2), (10, 2)]);
        let params = BatchParams {
            batch_bins: 60,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        // 26 bins per utterance → 2 per batch
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
    }

    #[test]
    fn bin_borrows_for_min_batch_size() {
        let data = manifest(&[(10, 2), (10, 2), (10, 2), (10, 2), (10, 2)]);
        let params = BatchParams {
            batch_bins: 60,
            min_batch_size: 2,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        assert!(batches.iter().all(|b| b.len() >= 2));
        assert_eq!(total(&batches), 5);
    }

    #[test]
    fn frame_respects_each_budget() {
        let data = manifest(&[(10, 5), (10, 5), (10, 5), (10, 5)]);
        let params = BatchParams {
            batch_frames_in: 30,
            batch_frames_inout: 40,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        // inout: 15 * b <= 40 → 2 per batch
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2]);
    }

    #[test]
    fn frame_borrows_for_min_batch_size() {
        let data = manifest(&[(10, 5), (10, 5), (10, 5), (10, 5), (10, 5)]);
        let params = BatchParams {
            batch_frames_inout: 40,
            min_batch_size: 2,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        // [2, 2, 1] borrows backwards until the first batch merges into the second
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 2]);
        let mut seen: Vec<&str> = batches.iter().flat_map(ids).collect();
        seen.sort();
        assert_eq!(seen, data.ids().collect::<Vec<_>>());
    }

    #[test]
    fn frame_rejects_oversized_utterance() {
        let data = manifest(&[(10, 5), (100, 5)]);
        let params = BatchParams {
            batch_frames_in: 50,
            ..Default::default()
        };

        let err = make_batchset(TaskType::Asr, &data, &params).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Batch(BatchError::ExceedsBudget { len: 100, .. })
        ));
    }

    #[test]
    fn shuffle_requires_seq() {
        let data = manifest(&[(10, 1)]);
        let params = BatchParams {
            batch_bins: 100,
            batch_sort_key: SortKey::Shuffle,
            ..Default::default()
        };

        assert!(matches!(
            make_batchset(TaskType::Asr, &data, &params),
            Err(crate::error::Error::Batch(BatchError::ShuffleRequiresSeq))
        ));
    }

    #[test]
    fn shuffle_covers_every_utterance_once() {
        let data = manifest(&[(1, 1), (2, 1), (3, 1), (4, 1), (5, 1), (6, 1), (7, 1)]);
        let params = BatchParams {
            batch_size: 3,
            batch_sort_key: SortKey::Shuffle,
            seed: Some(3),
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        let mut seen: Vec<&str> = batches.iter().flat_map(ids).collect();
        seen.sort();
        assert_eq!(seen, data.ids().collect::<Vec<_>>());
    }

    #[test]
    fn tts_sorts_by_output() {
        let data = manifest(&[(10, 9), (30, 1), (20, 5)]);
        let params = BatchParams {
            batch_size: 3,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Tts, &data, &params).unwrap();

        assert_eq!(ids(&batches[0]), vec!["utt00", "utt02", "utt01"]);
    }

    #[test]
    fn categories_never_mix() {
        let mut data = manifest(&[(10, 1), (20, 1), (30, 1), (40, 1)]);
        for (i, utt) in data.utts.values_mut().enumerate() {
            utt.category = Some(if i % 2 == 0 { "a" } else { "b" }.to_string());
        }
        let params = BatchParams {
            batch_size: 4,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        assert_eq!(batches.len(), 2);
        for batch in &batches {
            let category = &batch[0].1.category;
            assert!(batch.iter().all(|(_, u)| &u.category == category));
        }
    }

    #[test]
    fn categories_keep_first_appearance_order() {
        let mut data = manifest(&[(10, 1), (20, 1), (30, 1), (40, 1)]);
        let tags = [Some("b"), None, Some("a"), Some("b")];
        for (utt, tag) in data.utts.values_mut().zip(tags) {
            utt.category = tag.map(str::to_string);
        }
        let params = BatchParams {
            batch_size: 4,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        assert_eq!(ids(&batches[0]), vec!["utt03", "utt00"]);
        assert_eq!(ids(&batches[1]), vec!["utt01"]);
        assert_eq!(ids(&batches[2]), vec!["utt02"]);
    }

    /// Write `data` to disk and point the fixture config at it.
    fn config_for(dir: &std::path::Path, data: &Manifest, replacements: &[(&str, &str)]) -> Config {
        let path = dir.join("data.json");
        std::fs::write(&path, serde_json::to_string(data).unwrap()).unwrap();

        let mut text = crate::config::tests::CONFIG.replace("train.json", &path.display().to_string());
        for (from, to) in replacements {
            text = text.replace(from, to);
        }
        Config::from_yaml(&text).unwrap()
    }

    #[test]
    fn tts_bounds_speech_with_src_max_len() {
        let dir = tempfile::tempdir().unwrap();
        // manifest input is speech (100 frames), output is text (10 tokens)
        let data = manifest(&[(100, 10), (100, 10), (100, 10), (100, 10)]);

        let tight = config_for(
            dir.path(),
            &data,
            &[("type: asr", "type: tts"), ("max_len: 3000", "max_len: 50")],
        );
        let batches = get_batches(&tight, Mode::Train).unwrap();
        // speech 100 / src 50 → factor 2 → 4 / 3 = 1 per batch
        assert_eq!(batches.data.iter().map(Vec::len).collect::<Vec<_>>(), vec![1, 1, 1, 1]);

        let text_bound = config_for(dir.path(), &data, &[("type: asr", "type: tts"), ("max_len: 100", "max_len: 5")]);
        let batches = get_batches(&text_bound, Mode::Train).unwrap();
        // text 10 / tgt 5 → factor 2 as well
        assert_eq!(batches.data.len(), 4);

        let open = config_for(dir.path(), &data, &[("type: asr", "type: tts")]);
        let batches = get_batches(&open, Mode::Train).unwrap();
        assert_eq!(batches.data.iter().map(Vec::len).collect::<Vec<_>>(), vec![4]);
        assert_eq!(batches.n_utts, 4);
    }

    #[test]
    fn num_batches_truncates() {
        let data = manifest(&[(10, 1), (20, 1), (30, 1), (40, 1)]);
        let params = BatchParams {
            batch_size: 1,
            num_batches: 2,
            ..Default::default()
        };

        let batches = make_batchset(TaskType::Asr, &data, &params).unwrap();

        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn rejects_too_few_utterances() {
        let data = manifest(&[(10, 1)]);
        let params = BatchParams {
            batch_size: 4,
            min_batch_size: 2,
            ..Default::default()
        };

        assert!(matches!(
            make_batchset(TaskType::Asr, &data, &params),
            Err(crate::error::Error::Batch(BatchError::TooFewUtterances { .. }))
        ));
    }
}
