//! Demo command implementation

use super::{emit, format_result};
use crate::cli::args::DemoArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{CheckpointConfig, ExperimentConfig};
use crate::extractor::CheckpointStore;
use crate::pipeline::Pipeline;

/// Hidden width of exported demo extractors.
const DEMO_HIDDEN_DIM: usize = 120;

/// Few-shot sizes kept small so the demo finishes quickly.
fn demo_config(args: &DemoArgs) -> ExperimentConfig {
    ExperimentConfig {
        seed: args.seed,
        num_source_tasks: args.tasks,
        num_source_samples_per_class: 20,
        num_test_samples_per_class: 50,
        ..ExperimentConfig::for_mode(args.mode)
    }
}

pub fn run_demo(args: DemoArgs, level: LogLevel) -> Result<(), String> {
    let mut config = demo_config(&args);

    if let Some(dir) = &args.export_checkpoints {
        let dims = [config.embedding_dim, DEMO_HIDDEN_DIM, config.embedding_dim];
        let paths = CheckpointStore::new(dir)
            .export_random(config.mode, config.num_source_tasks, &dims, config.seed)
            .map_err(|e| format!("[{}] {e}", e.code()))?;
        log(
            level,
            LogLevel::Verbose,
            &format!("Exported {} extractors to {}", paths.len(), dir.display()),
        );
        config.checkpoints = Some(CheckpointConfig { dir: dir.clone() });
    }

    log(
        level,
        LogLevel::Normal,
        &format!("Demo: {} synthetic source tasks, mode {}", config.num_source_tasks, config.mode),
    );

    let result = Pipeline::new(&config).execute().map_err(|e| format!("[{}] {e}", e.code()))?;
    emit(level, args.format, &format_result(&config, &result, args.format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::OutputFormat;
    use crate::config::DatasetMode;
    use tempfile::TempDir;

    fn args(tasks: usize) -> DemoArgs {
        DemoArgs {
            mode: DatasetMode::Dogs,
            seed: 1,
            tasks,
            export_checkpoints: None,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_demo_config_uses_mode_defaults() {
        let config = demo_config(&args(4));
        assert_eq!(config.num_classes(), 5);
        assert_eq!(config.num_source_tasks, 4);
        assert_eq!(config.seed, 1);
    }

    #[test]
    fn test_demo_identity_run() {
        assert!(run_demo(args(2), LogLevel::Quiet).is_ok());
    }

    #[test]
    fn test_demo_exports_checkpoints() {
        let tmp = TempDir::new().unwrap();
        let demo = DemoArgs { export_checkpoints: Some(tmp.path().to_path_buf()), ..args(2) };

        run_demo(demo, LogLevel::Quiet).unwrap();
        assert!(tmp.path().join("dogs_net0.safetensors").exists());
        assert!(tmp.path().join("dogs_net1.safetensors").exists());
    }

    #[test]
    fn test_demo_zero_tasks_fails_validation() {
        let err = run_demo(args(0), LogLevel::Quiet).unwrap_err();
        assert!(err.contains("E003"));
    }
}
