//! Model subcommand - build a registered model and run a dummy batch.

use candle::{Device, Tensor};
use eyre::{Context, Result};
use sonar_models::config::ModelConfig;
use sonar_models::registry::{from_safetensors, init_model};
use std::path::{Path, PathBuf};

/// Right-padded `[batch_size, max_len]` ids; row `i` is `i` tokens shorter.
pub fn dummy_batch(config: &ModelConfig, device: &Device) -> Result<Tensor> {
    let s = config.structure();
    let (batch, time) = (s.batch_size.max(1), s.max_len.max(1));
    let vocab = config.vocab_size().max(2) as u32;

    let ids: Vec<u32> = (0..batch)
        .flat_map(|i| {
            let len = time - i % time;
            (0..time).map(move |t| {
                if t < len {
                    (i as u32 * 7 + t as u32) % (vocab - 1) + 1
                } else {
                    0
                }
            })
        })
        .collect();

    Ok(Tensor::from_vec(ids, (batch, time), device)?)
}

/// Logits shape of a forward pass over [`dummy_batch`].
pub fn smoke_run(config_path: &Path, weights: Option<&Path>) -> Result<Vec<usize>> {
    let config = ModelConfig::from_file(config_path)
        .wrap_err_with(|| format!("failed to load config: {}", config_path.display()))?;
    let device = Device::Cpu;

    let model = match weights {
        Some(path) => from_safetensors(&config, path, &device)
            .wrap_err_with(|| format!("failed to load weights: {}", path.display()))?,
        None => init_model(&config, &device).wrap_err("failed to build model")?.0,
    };

    let ids = dummy_batch(&config, &device)?;
    let logits = model.forward(&ids, false).wrap_err("forward pass failed")?;

    tracing::info!(model = model.name(), input = ?ids.dims(), output = ?logits.dims(), "forward pass");
    Ok(logits.dims().to_vec())
}

pub fn execute(config: PathBuf, weights: Option<PathBuf>) -> Result<()> {
    let shape = smoke_run(&config, weights.as_deref())?;
    println!("logits: {shape:?}");
    Ok(())
}
