//! sonar: command line front end over sonar-feat, sonar-data and sonar-models.

pub mod batch;
pub mod cli;
pub mod feat;
pub mod model;
