//! Feat and fbank subcommands - waveform files to .npy features.

use candle::Device;
use eyre::{Context, Result};
use sonar_feat::extract::{extract_feat, extract_filterbank_with_deltas};
use sonar_feat::params::FeatParams;
use std::path::PathBuf;

/// Delta channels added by `--delta-delta`.
const DELTA_ORDER: usize = 2;

pub fn execute(paths: Vec<PathBuf>, params: FeatParams) -> Result<()> {
    tracing::info!(files = paths.len(), feat_type = %params.feat_type, "extracting features");

    let outputs = extract_feat(&paths, &params).wrap_err("feature extraction failed")?;
    report(&outputs, params.dry_run);

    Ok(())
}

pub fn execute_fbank(paths: Vec<PathBuf>, params: FeatParams, delta_delta: bool) -> Result<()> {
    let order = if delta_delta { DELTA_ORDER } else { 0 };
    tracing::info!(files = paths.len(), order, "extracting filterbanks");

    let outputs = extract_filterbank_with_deltas(&paths, &params, &Device::Cpu, order)
        .wrap_err("filterbank extraction failed")?;
    report(&outputs, params.dry_run);

    Ok(())
}

fn report(outputs: &[PathBuf], dry_run: bool) {
    if dry_run {
        return;
    }
    for path in outputs {
        println!("{}", path.display());
    }
}
