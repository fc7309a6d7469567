//! CLI module for maxcorr
//!
//! Argument parsing, command handlers and output utilities.

mod args;
mod commands;
mod logging;

pub use args::{parse_args, Cli, Command, DemoArgs, InfoArgs, OutputFormat, RunArgs, ValidateArgs};
pub use commands::run_command;
pub use logging::{init_tracing, log, tracing_filter, LogLevel};
