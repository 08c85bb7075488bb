//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Soilcheck: validation and report tables for soil health data
#[derive(Parser)]
#[command(name = "soilcheck")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormatChoice,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean and validate a dataset against the rule table
    Validate {
        #[command(flatten)]
        inputs: PipelineInputs,

        /// Print the validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate, aggregate and write render-ready report tables
    Report {
        #[command(flatten)]
        inputs: PipelineInputs,

        /// Output path for the report JSON (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Footnote language (en, es); overrides the config file
        #[arg(short, long)]
        language: Option<String>,
    },

    /// List the rules loaded from a rule table
    Rules {
        /// Path to the rule table CSV
        #[arg(value_name = "RULES")]
        rules: PathBuf,

        /// Only show rules for this sheet
        #[arg(short, long)]
        sheet: Option<String>,
    },
}

/// Files shared by the pipeline commands.
#[derive(Args, Debug, Clone)]
pub struct PipelineInputs {
    /// Path to the data file (CSV/TSV)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Path to the rule table CSV
    #[arg(short, long)]
    pub rules: PathBuf,

    /// Path to the data dictionary CSV
    #[arg(short, long)]
    pub dictionary: PathBuf,

    /// Pipeline configuration JSON
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormatChoice {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Compact => LogFormat::Compact,
            LogFormatChoice::Json => LogFormat::Json,
        }
    }
}
