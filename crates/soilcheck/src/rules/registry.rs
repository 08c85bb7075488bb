//! Registry of validation rules keyed by (sheet, variable).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::{DataType, ValidationRule};
use crate::error::{Result, SoilError};

/// Columns without a serde default.
const REQUIRED_HEADERS: &[&str] = &["sheet", "variable", "data_type"];

/// One row of the rule table, as written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRecord {
    pub sheet: String,
    pub variable: String,
    #[serde(default)]
    pub unique_by: String,
    #[serde(default)]
    pub required: String,
    pub data_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub validation_rule: String,
}

impl RuleRecord {
    /// Convert into a typed rule. `line` is used in error messages.
    fn into_rule(self, line: usize) -> Result<ValidationRule> {
        let context = |msg: String| {
            SoilError::Config(format!(
                "rule table line {} ({}/{}): {}",
                line, self.sheet, self.variable, msg
            ))
        };

        if self.sheet.trim().is_empty() || self.variable.trim().is_empty() {
            return Err(context("sheet and variable must not be empty".to_string()));
        }

        let required = parse_flag(&self.required)
            .ok_or_else(|| context(format!("invalid required flag '{}'", self.required)))?;
        let data_type = self
            .data_type
            .parse::<DataType>()
            .map_err(|e| context(config_message(e)))?;

        let unique_by = match self.unique_by.trim() {
            "" | "-" => None,
            keys => Some(
                keys.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect(),
            ),
        };

        ValidationRule::new(
            self.sheet.trim(),
            self.variable.trim(),
            unique_by,
            required,
            data_type,
            self.description.trim(),
            self.validation_rule.trim(),
        )
        .map_err(|e| context(config_message(e)))
    }
}

fn config_message(err: SoilError) -> String {
    match err {
        SoilError::Config(msg) => msg,
        other => other.to_string(),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "" => Some(false),
        _ => None,
    }
}

/// Holds the declarative rule set. Read-only after loading.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: IndexMap<(String, String), ValidationRule>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a rule table from a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SoilError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_reader(file)?;
        debug!(path = %path.display(), rules = registry.len(), "loaded rule table");
        Ok(registry)
    }

    /// Load a rule table from any CSV reader.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?;
        let missing: Vec<String> = REQUIRED_HEADERS
            .iter()
            .filter(|h| !headers.iter().any(|found| found == **h))
            .map(|h| h.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SoilError::MissingColumns {
                table: "Rule table".to_string(),
                columns: missing,
            });
        }

        let mut records = Vec::new();
        for result in csv_reader.deserialize::<RuleRecord>() {
            records.push(result?);
        }
        Self::from_records(records)
    }

    /// Build a registry from already-read records.
    pub fn from_records(records: impl IntoIterator<Item = RuleRecord>) -> Result<Self> {
        let mut registry = Self::new();
        for (idx, record) in records.into_iter().enumerate() {
            // Line 1 is the header
            registry.insert(record.into_rule(idx + 2)?);
        }
        Ok(registry)
    }

    /// Add a rule. A rule for an existing (sheet, variable) replaces it.
    pub fn insert(&mut self, rule: ValidationRule) {
        let key = (rule.sheet.clone(), rule.variable.clone());
        if self.rules.contains_key(&key) {
            warn!(
                sheet = %rule.sheet,
                variable = %rule.variable,
                "duplicate rule definition; the last one loaded wins"
            );
        }
        self.rules.insert(key, rule);
    }

    /// Rules for a sheet in load order.
    pub fn rules_for(&self, sheet: &str) -> Result<Vec<&ValidationRule>> {
        let rules: Vec<_> = self.rules.values().filter(|r| r.sheet == sheet).collect();
        if rules.is_empty() {
            return Err(SoilError::Config(format!(
                "no validation rules defined for sheet '{}' (known sheets: {})",
                sheet,
                self.sheets().join(", ")
            )));
        }
        Ok(rules)
    }

    /// Look up a single rule.
    pub fn get(&self, sheet: &str, variable: &str) -> Option<&ValidationRule> {
        self.rules.get(&(sheet.to_string(), variable.to_string()))
    }

    /// Sheets with at least one rule, in first-seen order.
    pub fn sheets(&self) -> Vec<&str> {
        let mut sheets: Vec<&str> = Vec::new();
        for (sheet, _) in self.rules.keys() {
            if !sheets.contains(&sheet.as_str()) {
                sheets.push(sheet);
            }
        }
        sheets
    }

    /// Variables marked `required` for a sheet.
    pub fn required_columns(&self, sheet: &str) -> Vec<&str> {
        self.rules
            .values()
            .filter(|r| r.sheet == sheet && r.required)
            .map(|r| r.variable.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleCheck;

    const TABLE: &str = "\
sheet,variable,unique_by,required,data_type,description,validation_rule
Data,producer_id,-,TRUE,character,Producer identifier,
Data,year,-,TRUE,integer,Sampling year,>= 2000
Data,sample_id,sample_id,TRUE,character,Sample identifier,\"no_duplicates,not_empty\"
Data,ph,-,FALSE,numeric,Soil pH,
";

    #[test]
    fn test_load_rule_table() {
        let registry = RuleRegistry::from_reader(TABLE.as_bytes()).unwrap();
        assert_eq!(registry.len(), 4);

        let rules = registry.rules_for("Data").unwrap();
        assert_eq!(rules[0].variable, "producer_id");
        assert!(rules[0].unique_by.is_none());

        let sample = registry.get("Data", "sample_id").unwrap();
        assert!(sample.checks.contains(&RuleCheck::NonEmpty));
        assert_eq!(registry.required_columns("Data"), vec!["producer_id", "year", "sample_id"]);
    }

    #[test]
    fn test_unknown_sheet_is_config_error() {
        let registry = RuleRegistry::from_reader(TABLE.as_bytes()).unwrap();
        let err = registry.rules_for("Dictionary").unwrap_err();
        assert!(matches!(err, SoilError::Config(msg) if msg.contains("Data")));
    }

    #[test]
    fn test_last_loaded_rule_wins() {
        let table = format!("{}Data,ph,-,TRUE,numeric,Soil pH again,>= 0\n", TABLE);
        let registry = RuleRegistry::from_reader(table.as_bytes()).unwrap();
        assert_eq!(registry.len(), 4);
        let ph = registry.get("Data", "ph").unwrap();
        assert!(ph.required);
        assert_eq!(ph.description, "Soil pH again");
        // Position of the first definition is kept
        assert_eq!(registry.rules_for("Data").unwrap()[3].variable, "ph");
    }

    #[test]
    fn test_bad_expression_reports_line() {
        let table = "sheet,variable,unique_by,required,data_type,description,validation_rule\n\
                     Data,year,-,TRUE,integer,,between 2000 and 2030\n";
        let err = RuleRegistry::from_reader(table.as_bytes()).unwrap_err();
        assert!(matches!(err, SoilError::Config(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_bad_required_flag() {
        let table = "sheet,variable,unique_by,required,data_type,description,validation_rule\n\
                     Data,year,-,maybe,integer,,\n";
        assert!(RuleRegistry::from_reader(table.as_bytes()).is_err());
    }

    #[test]
    fn test_composite_unique_by() {
        let table = "sheet,variable,unique_by,required,data_type,description,validation_rule\n\
                     Data,field_id,\"producer_id, field_id\",FALSE,character,,no_duplicates\n";
        let registry = RuleRegistry::from_reader(table.as_bytes()).unwrap();
        let rule = registry.get("Data", "field_id").unwrap();
        assert_eq!(
            rule.checks,
            vec![RuleCheck::Uniqueness {
                columns: vec!["producer_id".into(), "field_id".into()]
            }]
        );
    }

    #[test]
    fn test_missing_headers_are_structural_errors() {
        let table = "sheet,variable,required\nData,year,TRUE\n";
        let err = RuleRegistry::from_reader(table.as_bytes()).unwrap_err();
        match err {
            SoilError::MissingColumns { table, columns } => {
                assert_eq!(table, "Rule table");
                assert_eq!(columns, vec!["data_type"]);
            }
            other => panic!("Expected missing columns, got {other:?}"),
        }
    }
}
