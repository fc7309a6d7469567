//! CLI command implementations

mod demo;
mod info;
mod run;
mod validate;

use serde::Serialize;

use crate::cli::args::{Cli, Command, OutputFormat};
use crate::cli::LogLevel;
use crate::config::{DatasetMode, ExperimentConfig};
use crate::pipeline::PipelineResult;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);

    match cli.command {
        Command::Run(args) => run::run_experiment(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
        Command::Demo(args) => demo::run_demo(args, log_level),
    }
}

/// Serializable summary of one pipeline run.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    mode: DatasetMode,
    seed: u64,
    duration_seconds: f64,
    #[serde(flatten)]
    report: &'a crate::eval::EvalReport,
}

impl<'a> RunSummary<'a> {
    fn new(config: &ExperimentConfig, result: &'a PipelineResult) -> Self {
        Self {
            mode: config.mode,
            seed: config.seed,
            duration_seconds: result.duration_seconds,
            report: &result.report,
        }
    }
}

/// Render a run in the requested format.
fn format_result(
    config: &ExperimentConfig,
    result: &PipelineResult,
    format: OutputFormat,
) -> Result<String, String> {
    let summary = RunSummary::new(config, result);
    match format {
        OutputFormat::Text => Ok(format!(
            "Mode: {}  Seed: {}\n{}\nCompleted in {:.2}s",
            config.mode, config.seed, result.report, result.duration_seconds
        )),
        OutputFormat::Json => serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("JSON serialization error: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&summary).map_err(|e| format!("YAML serialization error: {e}"))
        }
    }
}

/// Print a report respecting quiet mode for text output.
fn emit(level: LogLevel, format: OutputFormat, rendered: &str) {
    match format {
        OutputFormat::Text => crate::cli::logging::log(level, LogLevel::Normal, rendered),
        OutputFormat::Json | OutputFormat::Yaml => println!("{rendered}"),
    }
}
