//! CLI argument types

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DatasetMode;

/// maxcorr: maximal-correlation transfer from frozen source extractors
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "maxcorr")]
#[command(version)]
#[command(about = "Fuse frozen source-task extractors with maximal-correlation statistics")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run an experiment from a YAML configuration
    Run(RunArgs),

    /// Validate a configuration file without running it
    Validate(ValidateArgs),

    /// Display the resolved configuration
    Info(InfoArgs),

    /// Run a self-contained experiment on synthetic data
    Demo(DemoArgs),
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown output format: {s}. Valid formats: text, json, yaml")),
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Report format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show the configuration summary after validating
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the demo command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct DemoArgs {
    /// Dataset mode (sets the class count)
    #[arg(long, default_value = "cifar")]
    pub mode: DatasetMode,

    /// Random seed
    #[arg(long, default_value_t = 142)]
    pub seed: u64,

    /// Number of source tasks
    #[arg(long, default_value_t = 10)]
    pub tasks: usize,

    /// Export seeded random dense extractors here and run with them
    #[arg(long, value_name = "DIR")]
    pub export_checkpoints: Option<PathBuf>,

    /// Report format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse arguments from an iterator (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_command() {
        let cli = parse_args(["maxcorr", "run", "exp.yaml", "--seed", "7", "-f", "json"]).unwrap();
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.config, PathBuf::from("exp.yaml"));
                assert_eq!(args.seed, Some(7));
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.output.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_parse_verbosity_count() {
        let cli = parse_args(["maxcorr", "-vv", "validate", "exp.yaml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_parse_demo_defaults() {
        let cli = parse_args(["maxcorr", "demo"]).unwrap();
        match cli.command {
            Command::Demo(args) => {
                assert_eq!(args.mode, DatasetMode::Cifar);
                assert_eq!(args.seed, 142);
                assert_eq!(args.tasks, 10);
                assert!(args.export_checkpoints.is_none());
            }
            _ => panic!("Expected Demo command"),
        }
    }

    #[test]
    fn test_parse_demo_mode() {
        let cli = parse_args(["maxcorr", "demo", "--mode", "tiny_imagenet"]).unwrap();
        let Command::Demo(args) = cli.command else { panic!("Expected Demo command") };
        assert_eq!(args.mode, DatasetMode::TinyImagenet);
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        assert!(parse_args(["maxcorr", "demo", "--mode", "mnist"]).is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
