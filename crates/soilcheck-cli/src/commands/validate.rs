//! Validate command - clean and validate a dataset.

use colored::Colorize;

use crate::cli::PipelineInputs;

pub fn run(inputs: PipelineInputs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (pipeline, dataset) = super::pipeline(&inputs)?;

    if !json {
        println!(
            "{} {} ({} rows, sheet '{}')",
            "Validating".cyan().bold(),
            inputs.file.display().to_string().white(),
            dataset.row_count(),
            pipeline.config().sheet
        );
    }

    let (_cleaned, report) = pipeline.validate(&dataset)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        super::print_report(&report);
        if !report.warnings.is_empty() {
            println!();
            println!("{}", "Coercion warnings:".yellow().bold());
            for w in &report.warnings {
                println!(
                    "  {:20} row {:<6} {}{}",
                    w.column.white(),
                    w.row_index + 1,
                    w.message,
                    w.original_value
                        .as_deref()
                        .map(|v| format!(" ('{}')", v))
                        .unwrap_or_default()
                );
            }
        }
    }

    if report.is_valid() {
        if !json {
            println!();
            println!("{}", "Dataset passed validation".green());
        }
        Ok(())
    } else {
        Err(format!("validation failed with {} errors", report.errors.len()).into())
    }
}
