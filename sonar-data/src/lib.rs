//! sonar-data: corpus manifests, minibatch construction and padded datasets.
//!
//! # Pipeline
//!
//! 1. [`config::Config`] is read from YAML
//! 2. [`batchfy::get_batches`] loads the JSON manifest of a split and groups
//!    utterances into minibatches
//! 3. [`converter::Converter`] reads each minibatch's feature and token payloads
//! 4. a [`task::Task`] pads them into [`dataset::Example`]s, epoch by epoch
//!
//! # Quick Start
//!
//! ```ignore
//! use sonar_data::config::{Config, Mode};
//! use sonar_data::task::build_task;
//!
//! let config = Config::from_file("demos/conf/asr-seq.yml")?;
//! let task = build_task(config, Mode::Train)?;
//! for example in task.dataset(Mode::Train, 16, 1)? {
//!     let example = example?;
//!     println!("{:?}", example.inputs.shape());
//! }
//! ```

pub mod batchfy;
pub mod config;
pub mod converter;
pub mod dataset;
pub mod error;
pub mod manifest;
pub mod task;
pub mod utils;
