//! CLI argument definitions using clap
//!
//! Commands:
//! - tracecause detect --log <path>
//! - tracecause extract --log <path> [--profile <p>] [--output <file>]
//! - tracecause run [--config <path>] [--log <path>] [--references <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tracecause - next-activity features and causal hypothesis tests for event logs
#[derive(Parser, Debug)]
#[command(name = "tracecause")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report the dataset profile detected for a log
    Detect {
        /// Event log (.csv, .json or .jsonl)
        #[arg(long)]
        log: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Extract the example dataset from a log
    Extract {
        /// Event log (.csv, .json or .jsonl)
        #[arg(long)]
        log: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// auto, generic, clinical or administrative
        #[arg(long)]
        profile: Option<String>,

        /// Write the dataset here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Extract, split, train, evaluate and test hypotheses
    Run {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Event log, overrides `log.path` from the configuration
        #[arg(long)]
        log: Option<PathBuf>,

        /// auto, generic, clinical or administrative
        #[arg(long)]
        profile: Option<String>,

        /// Reference table, overrides `causality.reference_path`
        #[arg(long)]
        references: Option<PathBuf>,

        /// Report directory, overrides `output_dir`
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::try_parse_from([
            "tracecause",
            "run",
            "--log",
            "sepsis.csv",
            "--profile",
            "clinical",
        ])
        .unwrap();
        match cli.command {
            Command::Run { log, profile, config, .. } => {
                assert_eq!(log, Some(PathBuf::from("sepsis.csv")));
                assert_eq!(profile.as_deref(), Some("clinical"));
                assert!(config.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_detect_requires_log() {
        assert!(Cli::try_parse_from(["tracecause", "detect"]).is_err());
    }
}
