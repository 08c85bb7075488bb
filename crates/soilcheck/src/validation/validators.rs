//! Validators for checking a dataset against declarative rules.

use indexmap::IndexMap;
use tracing::debug;

use crate::input::{Dataset, Value};
use crate::rules::{Comparison, DataType, RuleCheck, ValidationRule};

use super::report::{RuleKind, ValidationIssue, ValidationReport};

/// At most this many row identifiers are spelled out in a message.
const MAX_LISTED_ROWS: usize = 10;

/// Trait for validators.
pub trait Validator: Send + Sync {
    /// Run validation and return issues. Must not short-circuit.
    fn validate(
        &self,
        dataset: &Dataset,
        rules: &[&ValidationRule],
        ids: &RowIdentifiers,
    ) -> Vec<ValidationIssue>;
}

/// Resolves row indices to display identifiers.
pub struct RowIdentifiers {
    labels: Vec<String>,
}

impl RowIdentifiers {
    pub fn new(dataset: &Dataset, id_column: Option<&str>) -> Self {
        let column = id_column.and_then(|c| dataset.column_index(c));
        let labels = (0..dataset.row_count())
            .map(|row| {
                column
                    .and_then(|c| dataset.get(row, c))
                    .and_then(Value::as_text)
                    .unwrap_or_else(|| format!("row {}", row + 1))
            })
            .collect();
        Self { labels }
    }

    fn label(&self, row: usize) -> String {
        self.labels
            .get(row)
            .cloned()
            .unwrap_or_else(|| format!("row {}", row + 1))
    }

    fn labels(&self, rows: &[usize]) -> Vec<String> {
        rows.iter().map(|&r| self.label(r)).collect()
    }
}

fn list_preview(items: &[String]) -> String {
    let mut preview = items
        .iter()
        .take(MAX_LISTED_ROWS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > MAX_LISTED_ROWS {
        preview.push_str(&format!(" and {} more", items.len() - MAX_LISTED_ROWS));
    }
    preview
}

fn missing_rows(dataset: &Dataset, col_idx: usize) -> Vec<usize> {
    dataset
        .column_values(col_idx)
        .enumerate()
        .filter(|(_, v)| v.is_missing() || matches!(v, Value::Text(s) if Value::is_null_token(s)))
        .map(|(row, _)| row)
        .collect()
}

/// Completeness check shared by `required` and `not_empty`.
fn completeness_issue(
    dataset: &Dataset,
    column: &str,
    kind: RuleKind,
    ids: &RowIdentifiers,
) -> Option<ValidationIssue> {
    let Some(col_idx) = dataset.column_index(column) else {
        return Some(ValidationIssue::new(
            column,
            kind,
            format!("Column '{}' is missing from the dataset", column),
        ));
    };

    let rows = missing_rows(dataset, col_idx);
    if rows.is_empty() {
        return None;
    }
    let row_ids = ids.labels(&rows);
    Some(
        ValidationIssue::new(
            column,
            kind,
            format!(
                "Column '{}' has {} missing value(s) ({})",
                column,
                rows.len(),
                list_preview(&row_ids)
            ),
        )
        .with_rows(rows, row_ids),
    )
}

/// `required = true`: the column exists and has no missing values.
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn validate(
        &self,
        dataset: &Dataset,
        rules: &[&ValidationRule],
        ids: &RowIdentifiers,
    ) -> Vec<ValidationIssue> {
        rules
            .iter()
            .filter(|r| r.checks.contains(&RuleCheck::Required))
            .filter_map(|r| completeness_issue(dataset, &r.variable, RuleKind::Required, ids))
            .collect()
    }
}

/// `not_empty`: like required, independent of the `required` flag.
pub struct NonEmptyValidator;

impl Validator for NonEmptyValidator {
    fn validate(
        &self,
        dataset: &Dataset,
        rules: &[&ValidationRule],
        ids: &RowIdentifiers,
    ) -> Vec<ValidationIssue> {
        rules
            .iter()
            .filter(|r| r.checks.contains(&RuleCheck::NonEmpty))
            .filter_map(|r| completeness_issue(dataset, &r.variable, RuleKind::NotEmpty, ids))
            .collect()
    }
}

/// Validates that values match the declared data type.
pub struct TypeValidator;

impl Validator for TypeValidator {
    fn validate(
        &self,
        dataset: &Dataset,
        rules: &[&ValidationRule],
        ids: &RowIdentifiers,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for rule in rules {
            let Some(data_type) = rule.checks.iter().find_map(|c| match c {
                RuleCheck::Type { data_type } => Some(*data_type),
                _ => None,
            }) else {
                continue;
            };
            let Some(col_idx) = dataset.column_index(&rule.variable) else {
                continue;
            };

            let mismatches = find_type_mismatches(dataset, col_idx, data_type);
            if mismatches.is_empty() {
                continue;
            }

            let row_ids = ids.labels(&mismatches);
            issues.push(
                ValidationIssue::new(
                    &rule.variable,
                    RuleKind::DataType,
                    format!(
                        "{} value(s) in '{}' are not {} ({})",
                        mismatches.len(),
                        rule.variable,
                        data_type.as_str(),
                        list_preview(&row_ids)
                    ),
                )
                .with_rows(mismatches, row_ids),
            );
        }

        issues
    }
}

fn find_type_mismatches(dataset: &Dataset, col_idx: usize, data_type: DataType) -> Vec<usize> {
    dataset
        .column_values(col_idx)
        .enumerate()
        .filter(|(_, value)| !value.is_missing())
        .filter(|(_, value)| match data_type {
            DataType::Integer => !value.as_number().is_some_and(|n| n.fract() == 0.0),
            DataType::Numeric => value.as_number().is_none(),
            DataType::Character => false,
        })
        .map(|(row, _)| row)
        .collect()
}

/// Validates comparison expressions such as `>= 2000`.
pub struct RangeValidator;

impl Validator for RangeValidator {
    fn validate(
        &self,
        dataset: &Dataset,
        rules: &[&ValidationRule],
        ids: &RowIdentifiers,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for rule in rules {
            let Some(col_idx) = dataset.column_index(&rule.variable) else {
                continue;
            };

            for check in &rule.checks {
                let RuleCheck::Range { comparison } = check else {
                    continue;
                };

                let violations = find_violations(dataset, col_idx, comparison);
                if violations.is_empty() {
                    continue;
                }

                let row_ids = ids.labels(&violations);
                issues.push(
                    ValidationIssue::new(
                        &rule.variable,
                        RuleKind::Range,
                        format!(
                            "{} value(s) in '{}' violate '{}' ({})",
                            violations.len(),
                            rule.variable,
                            comparison,
                            list_preview(&row_ids)
                        ),
                    )
                    .with_rows(violations, row_ids),
                );
            }
        }

        issues
    }
}

/// Non-numeric values are left to the type check.
fn find_violations(dataset: &Dataset, col_idx: usize, comparison: &Comparison) -> Vec<usize> {
    dataset
        .column_values(col_idx)
        .enumerate()
        .filter_map(|(row, value)| value.as_number().map(|n| (row, n)))
        .filter(|(_, n)| !comparison.holds(*n))
        .map(|(row, _)| row)
        .collect()
}

/// Validates `no_duplicates` over the `unique_by` columns.
pub struct UniquenessValidator;

impl Validator for UniquenessValidator {
    fn validate(
        &self,
        dataset: &Dataset,
        rules: &[&ValidationRule],
        ids: &RowIdentifiers,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for rule in rules {
            let Some(columns) = rule.checks.iter().find_map(|c| match c {
                RuleCheck::Uniqueness { columns } => Some(columns),
                _ => None,
            }) else {
                continue;
            };

            let Some(indices) = columns
                .iter()
                .map(|c| dataset.column_index(c))
                .collect::<Option<Vec<_>>>()
            else {
                debug!(
                    variable = %rule.variable,
                    ?columns,
                    "uniqueness key column absent; skipped"
                );
                continue;
            };

            let duplicates = find_duplicates(dataset, &indices);
            if duplicates.is_empty() {
                continue;
            }

            let keys: Vec<String> = duplicates.keys().map(|k| display_key(k)).collect();
            let rows: Vec<usize> = duplicates.values().flatten().copied().collect();
            let detail: Vec<String> = duplicates
                .iter()
                .zip(&keys)
                .map(|((_, key_rows), key)| {
                    format!("{} ({})", key, ids.labels(key_rows).join(", "))
                })
                .collect();
            let row_ids = ids.labels(&rows);

            issues.push(
                ValidationIssue::new(
                    &rule.variable,
                    RuleKind::NoDuplicates,
                    format!(
                        "{} duplicated key(s) for {}: {}",
                        keys.len(),
                        columns.join(" + "),
                        list_preview(&detail)
                    ),
                )
                .with_rows(rows, row_ids)
                .with_keys(keys),
            );
        }

        issues
    }
}

/// Rows grouped by their key tuple, keeping only tuples seen more than once.
fn find_duplicates(
    dataset: &Dataset,
    indices: &[usize],
) -> IndexMap<Vec<Option<String>>, Vec<usize>> {
    let mut key_rows: IndexMap<Vec<Option<String>>, Vec<usize>> = IndexMap::new();

    for row in 0..dataset.row_count() {
        let parts: Vec<Option<String>> = indices
            .iter()
            .map(|&c| dataset.get(row, c).and_then(Value::as_text))
            .collect();
        if parts.iter().all(Option::is_none) {
            continue;
        }
        key_rows.entry(parts).or_default().push(row);
    }

    key_rows.retain(|_, rows| rows.len() > 1);
    key_rows
}

fn display_key(parts: &[Option<String>]) -> String {
    parts
        .iter()
        .map(|p| p.as_deref().unwrap_or("NA"))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Composite validator that runs every rule check.
pub struct ValidationEngine {
    validators: Vec<Box<dyn Validator>>,
    id_column: Option<String>,
}

impl ValidationEngine {
    /// Create a new validation engine with all validators.
    pub fn new() -> Self {
        Self {
            validators: vec![
                Box::new(RequiredValidator),
                Box::new(TypeValidator),
                Box::new(RangeValidator),
                Box::new(UniquenessValidator),
                Box::new(NonEmptyValidator),
            ],
            id_column: None,
        }
    }

    /// Identify rows by this column's value in messages.
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    /// Run all validators and collect every issue.
    ///
    /// Issues are ordered by check kind, then by rule load order, so repeated
    /// runs on the same inputs produce identical reports.
    pub fn validate(&self, dataset: &Dataset, rules: &[&ValidationRule]) -> ValidationReport {
        let ids = RowIdentifiers::new(dataset, self.id_column.as_deref());

        let mut errors = Vec::new();
        for validator in &self.validators {
            errors.extend(validator.validate(dataset, rules, &ids));
        }

        debug!(
            rules = rules.len(),
            rows = dataset.row_count(),
            errors = errors.len(),
            "validated dataset"
        );

        ValidationReport::new(errors)
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}
