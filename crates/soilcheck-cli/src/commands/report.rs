//! Report command - run the full pipeline and write report tables.

use std::path::PathBuf;

use colored::Colorize;
use soilcheck::Language;

use crate::cli::PipelineInputs;

pub fn run(
    inputs: PipelineInputs,
    output: Option<PathBuf>,
    language: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, rules, dictionary, dataset) = super::load(&inputs)?;
    if let Some(lang) = language {
        config.language = lang.parse::<Language>()?;
    }
    let pipeline = soilcheck::Pipeline::new(config, rules, dictionary);

    let run = pipeline.run(&dataset)?;

    let Some(tables) = run.tables else {
        super::print_report(&run.report);
        return Err("dataset failed validation; no report tables built".into());
    };

    let json = serde_json::to_string_pretty(&tables)?;
    match &output {
        Some(path) => {
            std::fs::write(path, json)
                .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
            println!(
                "{} {} tables to {}",
                "Wrote".green().bold(),
                tables.tables.len(),
                path.display().to_string().white()
            );
        }
        None => println!("{}", json),
    }

    for failure in &tables.failures {
        eprintln!(
            "{} {}: {}",
            "Skipped group".yellow().bold(),
            failure.group,
            failure.message
        );
    }

    Ok(())
}
