//! Wide-to-long pivot of a cleaned dataset.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dictionary::Dictionary;
use crate::input::{Dataset, Value};

/// One (sample, measurement) observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongFormatRow {
    pub sample_id: String,
    pub producer_id: String,
    pub year: Option<i32>,
    /// Dictionary abbreviation; also the header join key.
    pub measurement: String,
    pub measurement_group: String,
    pub value: Option<f64>,
    /// Carried categorical columns; absent keys are missing values.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
}

impl LongFormatRow {
    /// Value of a carried column, used as a grouping key.
    pub fn grouping_key(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }
}

/// Which wide columns feed the long format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotColumns {
    pub sample_id: String,
    pub producer_id: String,
    pub year: String,
    /// Categorical columns copied onto every long row.
    pub attributes: Vec<String>,
    /// Dictionary columns that are not pivoted (never numeric).
    pub skip: Vec<String>,
}

impl Default for PivotColumns {
    fn default() -> Self {
        Self {
            sample_id: "sample_id".to_string(),
            producer_id: "producer_id".to_string(),
            year: "year".to_string(),
            attributes: vec!["texture".to_string(), "field_id".to_string()],
            skip: vec!["texture".to_string()],
        }
    }
}

/// A long-format dataset plus the attribute columns it carries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LongFormat {
    pub rows: Vec<LongFormatRow>,
    /// Attribute columns that existed in the wide dataset.
    pub carried_columns: Vec<String>,
}

impl LongFormat {
    /// Pivot a cleaned wide dataset: one row per sample and dictionary
    /// measurement present in the dataset, in sample then dictionary order.
    pub fn pivot(dataset: &Dataset, dictionary: &Dictionary, columns: &PivotColumns) -> Self {
        let measurements: Vec<(usize, &str, &str)> = dictionary
            .iter()
            .filter(|e| !columns.skip.contains(&e.column_name))
            .filter_map(|e| {
                dataset
                    .column_index(&e.column_name)
                    .map(|idx| (idx, e.abbreviation.as_str(), e.measurement_group.as_str()))
            })
            .collect();

        let carried: Vec<(usize, &String)> = columns
            .attributes
            .iter()
            .filter_map(|name| dataset.column_index(name).map(|idx| (idx, name)))
            .collect();

        let sample_idx = dataset.column_index(&columns.sample_id);
        let producer_idx = dataset.column_index(&columns.producer_id);
        let year_idx = dataset.column_index(&columns.year);

        let text_at = |row: usize, idx: Option<usize>| {
            idx.and_then(|c| dataset.get(row, c))
                .and_then(Value::as_text)
                .unwrap_or_default()
        };

        let mut rows = Vec::with_capacity(dataset.row_count() * measurements.len());
        for row in 0..dataset.row_count() {
            let sample_id = text_at(row, sample_idx);
            let producer_id = text_at(row, producer_idx);
            let year = year_idx
                .and_then(|c| dataset.get(row, c))
                .and_then(Value::as_number)
                .filter(|n| n.fract() == 0.0)
                .map(|n| n as i32);
            let attributes: IndexMap<String, String> = carried
                .iter()
                .filter_map(|&(idx, name)| {
                    dataset
                        .get(row, idx)
                        .and_then(Value::as_text)
                        .map(|v| (name.clone(), v))
                })
                .collect();

            for &(idx, measurement, group) in &measurements {
                rows.push(LongFormatRow {
                    sample_id: sample_id.clone(),
                    producer_id: producer_id.clone(),
                    year,
                    measurement: measurement.to_string(),
                    measurement_group: group.to_string(),
                    value: dataset.get(row, idx).and_then(Value::as_number),
                    attributes: attributes.clone(),
                });
            }
        }

        Self {
            rows,
            carried_columns: carried.into_iter().map(|(_, name)| name.clone()).collect(),
        }
    }

    /// Whether `column` was present in the wide dataset.
    pub fn carries(&self, column: &str) -> bool {
        self.carried_columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
