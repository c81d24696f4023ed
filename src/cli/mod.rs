//! CLI module for cardquery
//!
//! Provides command-line interface for:
//! - query: execute a query against a data directory
//! - parse: show how a query is understood
//! - bench: time the evaluator's set implementations

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::run_command;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_response, write_response_to};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args().command)
}
