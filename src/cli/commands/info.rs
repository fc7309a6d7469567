//! Info command implementation

use serde::Serialize;

use crate::cli::args::{InfoArgs, OutputFormat};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::ExperimentConfig;

/// Resolved configuration plus derived values.
#[derive(Serialize)]
struct ConfigInfo<'a> {
    num_classes: usize,
    #[serde(flatten)]
    config: &'a ExperimentConfig,
}

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let config =
        ExperimentConfig::from_file(&args.config).map_err(|e| format!("Config error: {e}"))?;
    let info = ConfigInfo { num_classes: config.num_classes(), config: &config };

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Configuration Info:");
            log(level, LogLevel::Normal, &super::validate::format_sampling_info(&config));
            log(level, LogLevel::Normal, &super::validate::format_extractor_info(&config));
            log(level, LogLevel::Normal, &super::validate::format_data_info(&config));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&info)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&info)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
