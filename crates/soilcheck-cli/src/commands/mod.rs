//! CLI command implementations.

pub mod report;
pub mod rules;
pub mod validate;

use colored::Colorize;
use soilcheck::{
    Dataset, Dictionary, Parser, Pipeline, PipelineConfig, RuleRegistry, ValidationReport,
};

use crate::cli::PipelineInputs;

/// Load config, rules, dictionary and data for a pipeline command.
pub(crate) fn load(
    inputs: &PipelineInputs,
) -> Result<(PipelineConfig, RuleRegistry, Dictionary, Dataset), Box<dyn std::error::Error>> {
    for path in [&inputs.file, &inputs.rules, &inputs.dictionary] {
        if !path.exists() {
            return Err(format!("File not found: {}", path.display()).into());
        }
    }

    let config = match &inputs.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let rules = RuleRegistry::from_path(&inputs.rules)?;
    let dictionary = Dictionary::from_path(&inputs.dictionary)?;
    let (dataset, _source) = Parser::new().parse_file(&inputs.file)?;

    Ok((config, rules, dictionary, dataset))
}

pub(crate) fn pipeline(
    inputs: &PipelineInputs,
) -> Result<(Pipeline, Dataset), Box<dyn std::error::Error>> {
    let (config, rules, dictionary, dataset) = load(inputs)?;
    Ok((Pipeline::new(config, rules, dictionary), dataset))
}

/// Print a validation report for a terminal.
pub(crate) fn print_report(report: &ValidationReport) {
    println!(
        "Found {} errors, {} warnings",
        report.errors.len().to_string().red().bold(),
        report.warnings.len().to_string().yellow()
    );

    if !report.errors.is_empty() {
        println!();
        println!("{}", "Errors:".red().bold());
        for issue in &report.errors {
            println!(
                "  {:20} {:14} {}",
                issue.column.white(),
                issue.rule.label().red(),
                issue.message
            );
        }
    }
}
