//! Tabular body of a report: one row per grouping value plus a baseline row.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::header::{HeaderSpec, ROW_ID_KEY};
use crate::aggregate::VariableSummary;
use crate::input::Value;

/// A table whose columns are header keys. The last row is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl SummaryTable {
    /// Rows are padded or truncated to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Missing);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Build a group table from grouped means and baseline (ungrouped) means.
    ///
    /// Rows follow the first appearance of each grouping value. ID columns
    /// other than the row label start out missing; see [`Self::fill_id_column`].
    pub fn from_summaries(
        header: &HeaderSpec,
        grouped: &[VariableSummary],
        baseline: &[VariableSummary],
        baseline_label: &str,
    ) -> Self {
        let columns: Vec<String> = header.keys().into_iter().map(String::from).collect();

        let mut by_group: IndexMap<&str, IndexMap<&str, Option<f64>>> = IndexMap::new();
        for s in grouped {
            if let Some(group) = s.group.as_deref() {
                by_group
                    .entry(group)
                    .or_default()
                    .insert(s.measurement.as_str(), s.mean);
            }
        }
        let baseline_means: IndexMap<&str, Option<f64>> = baseline
            .iter()
            .map(|s| (s.measurement.as_str(), s.mean))
            .collect();

        let build_row = |label: &str, means: &IndexMap<&str, Option<f64>>| -> Vec<Value> {
            columns
                .iter()
                .map(|key| {
                    if key == ROW_ID_KEY {
                        Value::from(label)
                    } else if header.is_id(key) {
                        Value::Missing
                    } else {
                        means.get(key.as_str()).copied().flatten().into()
                    }
                })
                .collect()
        };

        let mut rows: Vec<Vec<Value>> = by_group
            .iter()
            // Skip grouping values with no measurement of this table
            .filter(|(_, means)| columns.iter().any(|c| means.contains_key(c.as_str())))
            .map(|(group, means)| build_row(group, means))
            .collect();
        rows.push(build_row(baseline_label, &baseline_means));

        Self { columns, rows }
    }

    /// Fill an ID column from values keyed by row label.
    pub fn fill_id_column(
        &mut self,
        key: &str,
        values: &IndexMap<String, Option<String>>,
        baseline_value: Option<String>,
    ) {
        let (Some(col), Some(label_col)) = (self.column_index(key), self.column_index(ROW_ID_KEY))
        else {
            return;
        };
        let last = self.rows.len().saturating_sub(1);
        for (idx, row) in self.rows.iter_mut().enumerate() {
            let value = if idx == last {
                baseline_value.clone()
            } else {
                row.get(label_col)
                    .and_then(Value::as_text)
                    .and_then(|label| values.get(&label).cloned().flatten())
            };
            if let Some(cell) = row.get_mut(col) {
                *cell = value.map(Value::Text).unwrap_or(Value::Missing);
            }
        }
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == key)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The baseline (last) row.
    pub fn baseline(&self) -> Option<&Vec<Value>> {
        self.rows.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::header::HeaderSpecRow;

    fn summary(measurement: &str, group: Option<&str>, mean: Option<f64>) -> VariableSummary {
        VariableSummary {
            measurement: measurement.to_string(),
            measurement_group: "Chemical".to_string(),
            group: group.map(String::from),
            mean,
            count: 1,
        }
    }

    fn header() -> HeaderSpec {
        HeaderSpec {
            rows: vec![
                HeaderSpecRow::new(ROW_ID_KEY, ROW_ID_KEY, ""),
                HeaderSpecRow::new("Texture", "Texture", ""),
                HeaderSpecRow::new("pH", "pH", ""),
                HeaderSpecRow::new("P", "P", "ppm"),
            ],
            id_keys: vec![ROW_ID_KEY.to_string(), "Texture".to_string()],
        }
    }

    #[test]
    fn test_from_summaries_appends_baseline() {
        let grouped = vec![
            summary("pH", Some("F1"), Some(6.0)),
            summary("P", Some("F1"), None),
            summary("pH", Some("F2"), Some(7.0)),
            summary("SOC", Some("F3"), Some(1.0)),
        ];
        let baseline = vec![summary("pH", None, Some(6.5)), summary("P", None, Some(20.0))];
        let table = SummaryTable::from_summaries(&header(), &grouped, &baseline, "Project Average");

        assert_eq!(table.columns, vec![ROW_ID_KEY, "Texture", "pH", "P"]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[0][0], Value::from("F1"));
        assert_eq!(table.rows[0][2], Value::Number(6.0));
        assert_eq!(table.rows[0][3], Value::Missing);
        assert_eq!(table.rows[1][3], Value::Missing);
        assert_eq!(table.baseline().unwrap()[0], Value::from("Project Average"));
        assert_eq!(table.baseline().unwrap()[3], Value::Number(20.0));
    }

    #[test]
    fn test_fill_id_column() {
        let grouped = vec![summary("pH", Some("F1"), Some(6.0))];
        let baseline = vec![summary("pH", None, Some(6.0))];
        let mut table =
            SummaryTable::from_summaries(&header(), &grouped, &baseline, "Project Average");

        let mut values = IndexMap::new();
        values.insert("F1".to_string(), Some("Loam".to_string()));
        table.fill_id_column("Texture", &values, Some("Clay".to_string()));

        assert_eq!(table.rows[0][1], Value::from("Loam"));
        assert_eq!(table.rows[1][1], Value::from("Clay"));
    }

    #[test]
    fn test_new_fits_rows_to_columns() {
        let table = SummaryTable::new(
            vec![ROW_ID_KEY.to_string(), "Texture".to_string(), "pH".to_string()],
            vec![
                vec![Value::from("F1")],
                vec![Value::from("Avg"), Value::Missing, 6.0.into(), 1.0.into()],
            ],
        );
        assert!(table.rows.iter().all(|r| r.len() == 3));
    }

    #[test]
    fn test_fill_id_column_tolerates_short_rows() {
        let columns = vec![ROW_ID_KEY.to_string(), "Texture".to_string()];
        let mut table = SummaryTable::new(columns, vec![]);
        table.rows.push(vec![Value::from("F1")]);
        table.rows.push(vec![]);

        let mut values = IndexMap::new();
        values.insert("F1".to_string(), Some("Loam".to_string()));
        table.fill_id_column("Texture", &values, Some("Clay".to_string()));

        assert_eq!(table.rows[0], vec![Value::from("F1")]);
        assert!(table.rows[1].is_empty());
    }
}
