//! Project-level and per-variable summaries of long-format data.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::long::{LongFormat, LongFormatRow};

/// Label used for rows whose grouping value is missing.
pub const MISSING_GROUP: &str = "NA";

/// One summary row per measurement group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub measurement_group: String,
    /// Distinct samples with at least one non-missing value in the group.
    pub sample_count: usize,
    pub producer_count: usize,
    pub measurement_count: usize,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    /// Mode of the designated categorical attribute.
    pub representative: Option<String>,
}

/// Mean of one measurement, optionally within one grouping value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSummary {
    pub measurement: String,
    pub measurement_group: String,
    /// Grouping value, `None` for ungrouped summaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// `None` when every value in the group is missing.
    pub mean: Option<f64>,
    /// Number of non-missing values averaged.
    pub count: usize,
}

/// Deterministic, side-effect-free summaries.
pub struct Aggregator;

impl Aggregator {
    /// One row per measurement group, in first-appearance order.
    pub fn project_summary(long: &LongFormat, categorical: Option<&str>) -> Vec<ProjectSummary> {
        let mut by_group: IndexMap<&str, Vec<&LongFormatRow>> = IndexMap::new();
        for row in &long.rows {
            by_group.entry(row.measurement_group.as_str()).or_default().push(row);
        }

        by_group
            .into_iter()
            .map(|(group, rows)| {
                let measured: Vec<&LongFormatRow> =
                    rows.iter().copied().filter(|r| r.value.is_some()).collect();

                let samples: HashSet<&str> =
                    measured.iter().map(|r| r.sample_id.as_str()).collect();
                let producers: HashSet<&str> =
                    measured.iter().map(|r| r.producer_id.as_str()).collect();
                let measurements: HashSet<&str> =
                    rows.iter().map(|r| r.measurement.as_str()).collect();
                let years = || measured.iter().filter_map(|r| r.year);

                ProjectSummary {
                    measurement_group: group.to_string(),
                    sample_count: samples.len(),
                    producer_count: producers.len(),
                    measurement_count: measurements.len(),
                    year_min: years().min(),
                    year_max: years().max(),
                    representative: categorical
                        .and_then(|column| Self::sample_mode(measured.iter().copied(), column)),
                }
            })
            .collect()
    }

    /// Mean of `value` by (measurement, measurement_group) and, when present
    /// in the data, one grouping column. An absent grouping column falls
    /// back to the ungrouped summary.
    pub fn variable_summary(long: &LongFormat, group_by: Option<&str>) -> Vec<VariableSummary> {
        let group_by = group_by.filter(|column| {
            let carried = long.carries(column);
            if !carried {
                debug!(column = %column, "grouping column not in dataset; using ungrouped means");
            }
            carried
        });

        let mut acc: IndexMap<(&str, &str, Option<&str>), (f64, usize)> = IndexMap::new();
        for row in &long.rows {
            let group = group_by.map(|column| row.grouping_key(column).unwrap_or(MISSING_GROUP));
            let entry = acc
                .entry((row.measurement.as_str(), row.measurement_group.as_str(), group))
                .or_insert((0.0, 0));
            if let Some(value) = row.value {
                entry.0 += value;
                entry.1 += 1;
            }
        }

        acc.into_iter()
            .map(|((measurement, measurement_group, group), (sum, count))| VariableSummary {
                measurement: measurement.to_string(),
                measurement_group: measurement_group.to_string(),
                group: group.map(str::to_string),
                mean: (count > 0).then(|| sum / count as f64),
                count,
            })
            .collect()
    }

    /// Representative categorical value per grouping value, computed over
    /// distinct samples. Missing grouping values map to [`MISSING_GROUP`].
    pub fn representative_by_group(
        long: &LongFormat,
        categorical: &str,
        group_by: &str,
    ) -> IndexMap<String, Option<String>> {
        let mut by_group: IndexMap<&str, Vec<&LongFormatRow>> = IndexMap::new();
        for row in &long.rows {
            let key = row.grouping_key(group_by).unwrap_or(MISSING_GROUP);
            by_group.entry(key).or_default().push(row);
        }
        by_group
            .into_iter()
            .map(|(group, rows)| {
                (group.to_string(), Self::sample_mode(rows.into_iter(), categorical))
            })
            .collect()
    }

    /// Mode of an attribute over distinct samples (first row per sample).
    pub fn sample_mode<'a>(
        rows: impl Iterator<Item = &'a LongFormatRow>,
        column: &str,
    ) -> Option<String> {
        let mut seen = HashSet::new();
        let values = rows
            .filter(|r| seen.insert(r.sample_id.as_str()))
            .filter_map(|r| r.grouping_key(column));
        mode(values).map(str::to_string)
    }
}

/// Most frequent value; ties go to the value encountered first.
pub fn mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_row(
        sample: &str,
        measurement: &str,
        group: &str,
        value: Option<f64>,
        field: Option<&str>,
    ) -> LongFormatRow {
        let mut attributes = IndexMap::new();
        if let Some(f) = field {
            attributes.insert("field_id".to_string(), f.to_string());
        }
        LongFormatRow {
            sample_id: sample.to_string(),
            producer_id: "P1".to_string(),
            year: Some(2022),
            measurement: measurement.to_string(),
            measurement_group: group.to_string(),
            value,
            attributes,
        }
    }

    fn long(rows: Vec<LongFormatRow>, carried: &[&str]) -> LongFormat {
        LongFormat {
            rows,
            carried_columns: carried.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_mode_ties_break_by_first_seen() {
        assert_eq!(mode(["Clay", "Loam", "Loam", "Clay"]), Some("Clay"));
        assert_eq!(mode(["Sand", "Loam", "Loam"]), Some("Loam"));
        assert_eq!(mode(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_variable_summary_excludes_missing() {
        let data = long(
            vec![
                long_row("S1", "pH", "Chemical", Some(6.0), None),
                long_row("S2", "pH", "Chemical", None, None),
                long_row("S3", "pH", "Chemical", Some(7.0), None),
                long_row("S1", "SOC", "Carbon", None, None),
            ],
            &[],
        );
        let summary = Aggregator::variable_summary(&data, None);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].mean, Some(6.5));
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[1].mean, None);
    }

    #[test]
    fn test_absent_grouping_column_falls_back() {
        let data = long(
            vec![
                long_row("S1", "pH", "Chemical", Some(6.0), None),
                long_row("S2", "pH", "Chemical", Some(8.0), None),
            ],
            &[],
        );
        let grouped = Aggregator::variable_summary(&data, Some("treatment_id"));
        let ungrouped = Aggregator::variable_summary(&data, None);
        assert_eq!(grouped, ungrouped);
        assert_eq!(grouped[0].mean, Some(7.0));
    }

    #[test]
    fn test_grouped_means() {
        let data = long(
            vec![
                long_row("S1", "pH", "Chemical", Some(6.0), Some("F1")),
                long_row("S2", "pH", "Chemical", Some(8.0), Some("F2")),
                long_row("S3", "pH", "Chemical", Some(7.0), Some("F1")),
                long_row("S4", "pH", "Chemical", Some(5.0), None),
            ],
            &["field_id"],
        );
        let summary = Aggregator::variable_summary(&data, Some("field_id"));

        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].group.as_deref(), Some("F1"));
        assert_eq!(summary[0].mean, Some(6.5));
        assert_eq!(summary[1].group.as_deref(), Some("F2"));
        assert_eq!(summary[2].group.as_deref(), Some(MISSING_GROUP));
    }

    #[test]
    fn test_project_summary_per_group() {
        let mut rows = vec![
            long_row("S1", "pH", "Chemical", Some(6.0), Some("Loam")),
            long_row("S2", "pH", "Chemical", Some(6.2), Some("Clay")),
            long_row("S3", "pH", "Chemical", Some(6.4), Some("Clay")),
            long_row("S1", "SOC", "Carbon", Some(2.0), Some("Loam")),
            long_row("S2", "SOC", "Carbon", None, Some("Clay")),
        ];
        // Treat the field attribute as the categorical column here
        rows[0].year = Some(2020);
        let data = long(rows, &["field_id"]);

        let summary = Aggregator::project_summary(&data, Some("field_id"));
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].measurement_group, "Chemical");
        assert_eq!(summary[0].sample_count, 3);
        assert_eq!(summary[0].representative.as_deref(), Some("Clay"));
        assert_eq!(summary[0].year_min, Some(2020));
        assert_eq!(summary[0].year_max, Some(2022));
        assert_eq!(summary[1].sample_count, 1);
        assert_eq!(summary[1].representative.as_deref(), Some("Loam"));
    }

    #[test]
    fn test_sample_mode_counts_samples_once() {
        let rows = vec![
            long_row("S1", "pH", "Chemical", Some(6.0), Some("Loam")),
            long_row("S1", "SOC", "Carbon", Some(2.0), Some("Loam")),
            long_row("S1", "P", "Chemical", Some(2.0), Some("Loam")),
            long_row("S2", "pH", "Chemical", Some(6.0), Some("Clay")),
            long_row("S3", "pH", "Chemical", Some(6.0), Some("Clay")),
        ];
        assert_eq!(
            Aggregator::sample_mode(rows.iter(), "field_id").as_deref(),
            Some("Clay")
        );
    }
}
