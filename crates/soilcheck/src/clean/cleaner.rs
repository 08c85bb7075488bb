//! Cleaner: coerces measurement columns to numbers without dropping rows.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input::{Dataset, Value};

/// A non-fatal per-cell note raised while cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionWarning {
    pub column: String,
    /// Zero-based row index.
    pub row_index: usize,
    /// The value that failed to parse; `None` when the cell was already missing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_value: Option<String>,
    pub message: String,
}

/// Result of cleaning a dataset.
#[derive(Debug, Clone)]
pub struct CleanOutput {
    /// A new dataset; the input is untouched.
    pub dataset: Dataset,
    /// Warnings in row-major order.
    pub warnings: Vec<CoercionWarning>,
}

/// Coerces measurement columns to numeric values.
///
/// Columns listed as excluded (e.g. a texture class) are never coerced, even
/// when they also appear as measurement columns.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    measurement_columns: Vec<String>,
    excluded_columns: Vec<String>,
}

impl Cleaner {
    pub fn new(
        measurement_columns: impl IntoIterator<Item = impl Into<String>>,
        excluded_columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            measurement_columns: measurement_columns.into_iter().map(Into::into).collect(),
            excluded_columns: excluded_columns.into_iter().map(Into::into).collect(),
        }
    }

    fn is_measurement(&self, column: &str) -> bool {
        self.measurement_columns.iter().any(|c| c == column)
            && !self.excluded_columns.iter().any(|c| c == column)
    }

    /// Produce a cleaned copy of `dataset`.
    pub fn clean(&self, dataset: &Dataset) -> CleanOutput {
        let targets: Vec<(usize, &str)> = dataset
            .headers
            .iter()
            .enumerate()
            .filter(|(_, name)| self.is_measurement(name))
            .map(|(idx, name)| (idx, name.as_str()))
            .collect();

        // Refit rows in case the caller built the dataset by hand
        let mut cleaned = Dataset::new(dataset.headers.clone(), dataset.rows.clone());
        let mut warnings = Vec::new();

        for (row_idx, row) in cleaned.rows.iter_mut().enumerate() {
            for &(col_idx, column) in &targets {
                let cell = &mut row[col_idx];
                let (value, warning) = coerce_cell(cell, column, row_idx);
                *cell = value;
                warnings.extend(warning);
            }
        }

        debug!(
            columns = targets.len(),
            warnings = warnings.len(),
            "coerced measurement columns"
        );

        CleanOutput {
            dataset: cleaned,
            warnings,
        }
    }
}

fn coerce_cell(cell: &Value, column: &str, row_index: usize) -> (Value, Option<CoercionWarning>) {
    match cell {
        Value::Number(n) => (Value::Number(*n), None),
        Value::Text(raw) if !Value::is_null_token(raw) => match Value::parse_number(raw) {
            Some(n) => (Value::Number(n), None),
            None => (
                Value::Missing,
                Some(CoercionWarning {
                    column: column.to_string(),
                    row_index,
                    original_value: Some(raw.clone()),
                    message: format!(
                        "Non-numeric value '{}' in '{}' at row {} converted to missing",
                        raw.trim(),
                        column,
                        row_index + 1
                    ),
                }),
            ),
        },
        _ => (
            Value::Missing,
            Some(CoercionWarning {
                column: column.to_string(),
                row_index,
                original_value: None,
                message: format!("Missing value in '{}' at row {}", column, row_index + 1),
            }),
        ),
    }
}
