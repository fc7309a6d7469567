//! Validate command implementation

use crate::cli::args::ValidateArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{CheckpointConfig, ConfigValidator, DataConfig, ExperimentConfig};

/// Format sampling configuration as a string
pub fn format_sampling_info(config: &ExperimentConfig) -> String {
    [
        format!("  Mode: {} ({} classes)", config.mode, config.num_classes()),
        format!("  Source samples per class: {}", config.num_source_samples_per_class),
        format!("  Target samples per class: {}", config.num_target_samples_per_class),
        format!("  Test samples per class: {}", config.num_test_samples_per_class),
        format!("  Batch size: {}", config.batch_size),
        format!("  Seed: {}", config.seed),
    ]
    .join("\n")
}

/// Format extractor configuration as a string
pub fn format_extractor_info(config: &ExperimentConfig) -> String {
    let source = match &config.checkpoints {
        Some(CheckpointConfig { dir }) => format!("checkpoints in {}", dir.display()),
        None => "identity".to_string(),
    };
    [
        format!("  Source tasks: {}", config.num_source_tasks),
        format!("  Embedding dim: {}", config.embedding_dim),
        format!("  Extractors: {source}"),
        format!("  Classifier: {:?}", config.classifier),
    ]
    .join("\n")
}

/// Format data configuration as a string
pub fn format_data_info(config: &ExperimentConfig) -> String {
    match &config.data {
        DataConfig::Synthetic => "  Data: synthetic clusters".to_string(),
        DataConfig::Safetensors { source_train, target_train, test } => [
            "  Data: safetensors".to_string(),
            format!("    Source splits: {}", source_train.len()),
            format!("    Target train: {}", target_train.display()),
            format!("    Test: {}", test.display()),
        ]
        .join("\n"),
    }
}

/// Print detailed configuration summary
pub fn print_detailed_summary(config: &ExperimentConfig) {
    println!();
    println!("Configuration Summary:");
    println!("{}", format_sampling_info(config));
    println!();
    println!("{}", format_extractor_info(config));
    println!();
    println!("{}", format_data_info(config));
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating config: {}", args.config.display()));

    let config =
        ExperimentConfig::from_file(&args.config).map_err(|e| format!("Config error: {e}"))?;
    ConfigValidator::validate(&config).map_err(|e| format!("Validation failed: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed && level != LogLevel::Quiet {
        print_detailed_summary(&config);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("exp.yaml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_validate_accepts_defaults() {
        let (_tmp, config) = write_config("mode: dogs\n");
        assert!(run_validate(ValidateArgs { config, detailed: true }, LogLevel::Quiet).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_mode() {
        let (_tmp, config) = write_config("mode: imagenet\n");
        let err = run_validate(ValidateArgs { config, detailed: false }, LogLevel::Quiet)
            .unwrap_err();
        assert!(err.contains("imagenet"));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let (_tmp, config) = write_config("batch_size: 0\n");
        let err = run_validate(ValidateArgs { config, detailed: false }, LogLevel::Quiet)
            .unwrap_err();
        assert!(err.starts_with("Validation failed"));
    }

    #[test]
    fn test_format_sections() {
        let config = ExperimentConfig::default();
        assert!(format_sampling_info(&config).contains("2 classes"));
        assert!(format_extractor_info(&config).contains("identity"));
        assert!(format_data_info(&config).contains("synthetic"));
    }
}
