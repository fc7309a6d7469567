//! Run command implementation

use super::{emit, format_result, RunSummary};
use crate::cli::args::RunArgs;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::ExperimentConfig;
use crate::pipeline::Pipeline;

pub fn run_experiment(args: RunArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Verbose, &format!("Loading config: {}", args.config.display()));

    let mut config = ExperimentConfig::from_file(&args.config).map_err(|e| e.to_string())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let banner =
        format!("Running {} experiment with {} source tasks", config.mode, config.num_source_tasks);
    log(level, LogLevel::Normal, &banner);

    let result = Pipeline::new(&config).execute().map_err(|e| format!("[{}] {e}", e.code()))?;

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&RunSummary::new(&config, &result))
            .map_err(|e| format!("JSON serialization error: {e}"))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write report {}: {e}", path.display()))?;
        log(level, LogLevel::Verbose, &format!("Report written to {}", path.display()));
    }

    emit(level, args.format, &format_result(&config, &result, args.format)?);
    Ok(())
}
