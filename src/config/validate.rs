//! Configuration validation.
//!
//! Runs before any data is generated or any checkpoint is opened so that a
//! bad configuration fails fast with an actionable message.

use super::experiment::{DataConfig, ExperimentConfig};
use crate::error::{Error, Result};

/// Pre-flight validator for [`ExperimentConfig`].
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate an experiment configuration.
    pub fn validate(config: &ExperimentConfig) -> Result<()> {
        Self::validate_sampling(config)?;
        Self::validate_model(config)?;
        Self::validate_data(&config.data, config.num_source_tasks)?;
        Ok(())
    }

    fn validate_sampling(config: &ExperimentConfig) -> Result<()> {
        if config.num_target_samples_per_class == 0 {
            return Err(value_error(
                "num_target_samples_per_class",
                "must be positive",
                "Every target class needs an example for its class-conditional mean (20 recommended)",
            ));
        }

        if config.num_test_samples_per_class == 0 {
            return Err(value_error(
                "num_test_samples_per_class",
                "must be positive",
                "Use at least one test example per class",
            ));
        }

        if config.num_source_samples_per_class == 0 {
            return Err(value_error(
                "num_source_samples_per_class",
                "must be positive",
                format!(
                    "Use {} for mode '{}'",
                    config.mode.recommended_source_samples(),
                    config.mode
                ),
            ));
        }

        if config.batch_size == 0 {
            return Err(value_error("batch_size", "must be positive", "Use 64"));
        }

        Ok(())
    }

    fn validate_model(config: &ExperimentConfig) -> Result<()> {
        if config.num_source_tasks == 0 {
            return Err(value_error(
                "num_source_tasks",
                "at least one source task is required",
                "Use 10 source tasks (one per label partition)",
            ));
        }

        if config.embedding_dim == 0 {
            return Err(value_error(
                "embedding_dim",
                "must be positive",
                "Use the penultimate layer width of the source networks (84)",
            ));
        }

        Ok(())
    }

    fn validate_data(data: &DataConfig, num_source_tasks: usize) -> Result<()> {
        if let DataConfig::Safetensors { source_train, .. } = data {
            if !source_train.is_empty() && source_train.len() != num_source_tasks {
                return Err(value_error(
                    "data.source_train",
                    format!(
                        "{} files listed for {} source tasks",
                        source_train.len(),
                        num_source_tasks
                    ),
                    "List one file per source task, or none",
                ));
            }
        }
        Ok(())
    }
}

fn value_error(
    field: &str,
    message: impl Into<String>,
    suggestion: impl Into<String>,
) -> Error {
    Error::ConfigValue {
        field: field.into(),
        message: message.into(),
        suggestion: suggestion.into(),
    }
}
