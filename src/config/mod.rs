//! Experiment configuration
//!
//! - `experiment`: YAML-backed [`ExperimentConfig`] and [`DatasetMode`]
//! - `validate`: pre-flight [`ConfigValidator`]

mod experiment;
mod validate;

pub use experiment::{
    CheckpointConfig, ClassifierKind, DataConfig, DatasetMode, ExperimentConfig,
};
pub use validate::ConfigValidator;
