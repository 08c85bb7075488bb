//! Rules command - list loaded validation rules.

use std::path::PathBuf;

use colored::Colorize;
use soilcheck::{RuleCheck, RuleRegistry};

pub fn run(path: PathBuf, sheet: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let registry = RuleRegistry::from_path(&path)?;
    let sheets: Vec<&str> = match &sheet {
        Some(s) => vec![s.as_str()],
        None => registry.sheets(),
    };

    println!(
        "Loaded {} rules from {}",
        registry.len().to_string().white().bold(),
        path.display()
    );

    for sheet in sheets {
        let rules = registry.rules_for(sheet)?;
        println!();
        println!("{} ({} rules)", sheet.cyan().bold(), rules.len());
        for rule in rules {
            let checks: Vec<String> = rule.checks.iter().map(describe).collect();
            println!("  {:20} {}", rule.variable.white(), checks.join(", "));
        }
    }

    Ok(())
}

fn describe(check: &RuleCheck) -> String {
    match check {
        RuleCheck::Required => "required".to_string(),
        RuleCheck::Type { data_type } => data_type.as_str().to_string(),
        RuleCheck::Range { comparison } => comparison.to_string(),
        RuleCheck::Uniqueness { columns } => format!("unique by {}", columns.join(" + ")),
        RuleCheck::NonEmpty => "not empty".to_string(),
    }
}
