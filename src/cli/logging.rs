//! Logging utilities for CLI output
//!
//! User-facing messages go to stdout through [`log`]; library diagnostics
//! are `tracing` events written to stderr.

use tracing_subscriber::{fmt, EnvFilter};

/// Log level for CLI output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    /// Level selected by the `-q` and `-v` flags; quiet wins.
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose > 0 {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

/// Filter directive for the tracing subscriber.
///
/// Without `-v`, `RUST_LOG` is honoured and defaults to `warn`.
pub fn tracing_filter(quiet: bool, verbose: u8) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Install the stderr tracing subscriber.
///
/// A second call is a no-op.
pub fn init_tracing(quiet: bool, verbose: u8) {
    let _ = fmt()
        .with_env_filter(tracing_filter(quiet, verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
