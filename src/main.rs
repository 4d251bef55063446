//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to
//! [`runner::run`].

use clap::Parser;
use clap::error::ErrorKind;
use std::io;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;
use yaml_doctor::{cli::Cli, runner};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(parsed) => parsed,
        Err(parse_error) => {
            let help_requested = matches!(
                parse_error.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );
            let _printed = parse_error.print();
            return if help_requested {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };
    let max_level = if cli.debug { Level::DEBUG } else { Level::ERROR };
    fmt().with_max_level(max_level).init();
    let mut stdout = io::stdout().lock();
    match runner::run(&cli, &mut stdout) {
        Ok(outcome) if outcome.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            tracing::error!(error = %error, "run failed");
            ExitCode::FAILURE
        }
    }
}
