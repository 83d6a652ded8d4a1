//! CLI module for tracecause
//!
//! Provides command-line interface for:
//! - detect: Report the profile and columns of a log
//! - extract: Write the example dataset of a log
//! - run: Full analysis with a run report

mod args;
mod commands;
mod errors;
mod io;
mod report;

pub use args::{Cli, Command};
pub use commands::{detect, extract, load_config, run, run_analysis, run_command, run_pipeline};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_document, write_error, write_response};
pub use report::RunReport;
