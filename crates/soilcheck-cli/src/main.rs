//! Soilcheck CLI - validate soil health datasets and build report tables.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use logging::{LogConfig, init_logging};

fn main() {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format.into()));

    let result = match cli.command {
        Commands::Validate { inputs, json } => commands::validate::run(inputs, json),

        Commands::Report {
            inputs,
            output,
            language,
        } => commands::report::run(inputs, output, language),

        Commands::Rules { rules, sheet } => commands::rules::run(rules, sheet),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
