//! maxcorr CLI
//!
//! # Usage
//!
//! ```bash
//! # Run an experiment
//! maxcorr run experiment.yaml
//!
//! # Run with a different seed and JSON output
//! maxcorr run experiment.yaml --seed 7 --format json
//!
//! # Validate config
//! maxcorr validate experiment.yaml --detailed
//!
//! # Show resolved config
//! maxcorr info experiment.yaml
//!
//! # Synthetic end-to-end run
//! maxcorr -v demo --mode dogs --export-checkpoints saved_models
//! ```

use clap::Parser;
use maxcorr::cli::{init_tracing, run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
