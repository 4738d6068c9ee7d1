//! Device batch arithmetic and seeded randomness.

use crate::error::{ConfigError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Deterministic generator when `seed` is set, entropy-seeded otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Split a global batch size across `num_gpus` devices.
///
/// Zero or one device keeps the global size.
pub fn per_device_batch_size(batch_size: usize, num_gpus: usize) -> Result<usize> {
    if num_gpus <= 1 {
        return Ok(batch_size);
    }

    if batch_size % num_gpus != 0 {
        return Err(ConfigError::IndivisibleBatchSize {
            batch_size,
            num_gpus,
        }
        .into());
    }

    Ok(batch_size / num_gpus)
}
