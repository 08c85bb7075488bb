//! Validation report types.

use serde::{Deserialize, Serialize};

use crate::clean::CoercionWarning;

/// Which kind of rule produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Required,
    DataType,
    Range,
    NoDuplicates,
    NotEmpty,
}

impl RuleKind {
    /// Get a human-readable label for the rule kind.
    pub fn label(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::DataType => "data_type",
            RuleKind::Range => "range",
            RuleKind::NoDuplicates => "no_duplicates",
            RuleKind::NotEmpty => "not_empty",
        }
    }
}

/// One rule violation, aggregated per column and rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub column: String,
    pub rule: RuleKind,
    pub message: String,
    /// Zero-based indices of offending rows.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<usize>,
    /// Identifiers of offending rows (sample id or `row <n>`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_ids: Vec<String>,
    /// Duplicated key values, for uniqueness errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl ValidationIssue {
    pub fn new(column: impl Into<String>, rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            rule,
            message: message.into(),
            rows: Vec::new(),
            row_ids: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Set the offending rows and their identifiers.
    pub fn with_rows(mut self, rows: Vec<usize>, row_ids: Vec<String>) -> Self {
        self.rows = rows;
        self.row_ids = row_ids;
        self
    }

    /// Set the duplicated keys.
    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }
}

/// Errors block progression; warnings are informational.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<CoercionWarning>,
}

impl ValidationReport {
    pub fn new(errors: Vec<ValidationIssue>) -> Self {
        Self {
            errors,
            warnings: Vec::new(),
        }
    }

    /// Attach cleaner warnings.
    pub fn with_warnings(mut self, warnings: Vec<CoercionWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// True when no errors were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors raised for one column.
    pub fn errors_for<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.errors.iter().filter(move |e| e.column == column)
    }

    /// One-line summary for display.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!("Validation passed with {} warning(s)", self.warnings.len())
        } else {
            format!(
                "Validation failed: {} error(s), {} warning(s)",
                self.errors.len(),
                self.warnings.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_validity() {
        let report = ValidationReport::default();
        assert!(report.is_valid());
        assert!(report.summary().starts_with("Validation passed"));

        let report = ValidationReport::new(vec![ValidationIssue::new(
            "year",
            RuleKind::Range,
            "1 value(s) violate '>= 2000'",
        )]);
        assert!(!report.is_valid());
        assert_eq!(report.errors_for("year").count(), 1);
        assert_eq!(report.errors_for("ph").count(), 0);
    }

    #[test]
    fn test_issue_serializes_rule_as_snake_case() {
        let issue = ValidationIssue::new("sample_id", RuleKind::NoDuplicates, "dup");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["rule"], "no_duplicates");
        assert!(json.get("rows").is_none());
    }
}
