//! Pipeline orchestration and public API.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::aggregate::{Aggregator, LongFormat, PivotColumns, ProjectSummary, VariableSummary};
use crate::clean::Cleaner;
use crate::dictionary::Dictionary;
use crate::error::{DictionaryError, Result, SoilError};
use crate::input::Dataset;
use crate::rules::RuleRegistry;
use crate::table::{FormattedTable, HeaderMapper, Language, SummaryTable, TableFormatter};
use crate::validation::{ValidationEngine, ValidationReport};

/// Configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rule sheet applied to the dataset.
    pub sheet: String,
    /// Identifies rows in validation messages.
    pub sample_id_column: String,
    pub producer_id_column: String,
    pub year_column: String,
    /// Attribute whose mode represents a group (None = skip).
    pub categorical_column: Option<String>,
    /// Dictionary columns never coerced or tabulated as measurements.
    pub excluded_columns: Vec<String>,
    /// Categorical columns carried into the long format.
    pub attribute_columns: Vec<String>,
    /// Column whose values become the rows of each group table.
    pub grouping_column: Option<String>,
    /// Extra ID columns appended to every header. The first one holds the
    /// representative `categorical_column` value.
    pub id_keys: Vec<String>,
    /// Label of the baseline row.
    pub baseline_label: String,
    pub language: Language,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sheet: "Data".to_string(),
            sample_id_column: "sample_id".to_string(),
            producer_id_column: "producer_id".to_string(),
            year_column: "year".to_string(),
            categorical_column: Some("texture".to_string()),
            excluded_columns: vec!["texture".to_string()],
            attribute_columns: vec!["texture".to_string(), "field_id".to_string()],
            grouping_column: Some("field_id".to_string()),
            id_keys: vec!["Texture".to_string()],
            baseline_label: "Project Average".to_string(),
            language: Language::English,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SoilError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    fn pivot_columns(&self) -> PivotColumns {
        let mut attributes = self.attribute_columns.clone();
        for column in self.categorical_column.iter().chain(&self.grouping_column) {
            if !attributes.contains(column) {
                attributes.push(column.clone());
            }
        }

        PivotColumns {
            sample_id: self.sample_id_column.clone(),
            producer_id: self.producer_id_column.clone(),
            year: self.year_column.clone(),
            attributes,
            skip: self.excluded_columns.clone(),
        }
    }
}

/// A measurement group whose table could not be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub group: String,
    pub message: String,
}

/// Aggregates and render-ready tables for a valid dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTables {
    pub project_summary: Vec<ProjectSummary>,
    pub variable_summary: Vec<VariableSummary>,
    /// One table per measurement group, in dictionary order.
    pub tables: IndexMap<String, FormattedTable>,
    pub failures: Vec<GroupFailure>,
}

/// Output of [`Pipeline::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Cleaned copy of the input dataset.
    pub cleaned: Dataset,
    pub report: ValidationReport,
    /// Present only when validation passed.
    pub tables: Option<ReportTables>,
}

/// Runs clean, validate, aggregate and format for one dataset.
///
/// Rules, dictionary and config are read-only after construction; every
/// call recomputes its outputs from scratch.
pub struct Pipeline {
    config: PipelineConfig,
    rules: RuleRegistry,
    dictionary: Dictionary,
    cleaner: Cleaner,
    validation: ValidationEngine,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, rules: RuleRegistry, dictionary: Dictionary) -> Self {
        let cleaner = Cleaner::new(
            dictionary.measurement_columns(),
            config.excluded_columns.iter().map(String::as_str),
        );
        let validation = ValidationEngine::new().with_id_column(config.sample_id_column.clone());

        Self {
            config,
            rules,
            dictionary,
            cleaner,
            validation,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Clean and validate. Fails only when the configured sheet has no rules.
    pub fn validate(&self, raw: &Dataset) -> Result<(Dataset, ValidationReport)> {
        let cleaned = {
            let _span = info_span!("clean", rows = raw.row_count()).entered();
            self.cleaner.clean(raw)
        };

        let _span = info_span!("validate", sheet = %self.config.sheet).entered();
        let rules = self.rules.rules_for(&self.config.sheet)?;
        let report = self
            .validation
            .validate(&cleaned.dataset, &rules)
            .with_warnings(cleaned.warnings);

        info!(
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "validation finished"
        );
        Ok((cleaned.dataset, report))
    }

    /// Run every stage. Aggregation is skipped when validation fails.
    pub fn run(&self, raw: &Dataset) -> Result<PipelineRun> {
        let (cleaned, report) = self.validate(raw)?;

        let tables = if report.is_valid() {
            Some(self.build_tables(&cleaned))
        } else {
            info!("dataset failed validation; skipping aggregation");
            None
        };

        Ok(PipelineRun {
            cleaned,
            report,
            tables,
        })
    }

    /// Aggregate a cleaned dataset and build every group table.
    ///
    /// A group whose header cannot be built is recorded in
    /// [`ReportTables::failures`]; the remaining groups still render.
    pub fn build_tables(&self, cleaned: &Dataset) -> ReportTables {
        let _span = info_span!("aggregate").entered();

        let long = LongFormat::pivot(cleaned, &self.dictionary, &self.config.pivot_columns());
        let categorical = self.config.categorical_column.as_deref();
        let grouping = self.config.grouping_column.as_deref();

        let project_summary = Aggregator::project_summary(&long, categorical);
        let variable_summary = Aggregator::variable_summary(&long, grouping);
        let baseline = Aggregator::variable_summary(&long, None);
        debug!(long_rows = long.len(), "aggregated long-format data");

        let measurements = Dictionary::from_entries(
            self.dictionary
                .iter()
                .filter(|e| !self.config.excluded_columns.contains(&e.column_name))
                .cloned(),
        );

        let mut tables = IndexMap::new();
        let mut failures = Vec::new();
        for group in measurements.groups() {
            let _span = info_span!("table", group = %group).entered();
            match self.group_table(&measurements, &long, group, &variable_summary, &baseline) {
                Ok(table) => {
                    tables.insert(group.to_string(), table);
                }
                Err(e) => {
                    warn!(group = %group, error = %e, "skipping group table");
                    failures.push(GroupFailure {
                        group: group.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        ReportTables {
            project_summary,
            variable_summary,
            tables,
            failures,
        }
    }

    fn group_table(
        &self,
        measurements: &Dictionary,
        long: &LongFormat,
        group: &str,
        grouped: &[VariableSummary],
        baseline: &[VariableSummary],
    ) -> std::result::Result<FormattedTable, DictionaryError> {
        let mut header = HeaderMapper::map(measurements, group)?;
        for key in &self.config.id_keys {
            header = header.with_id_column(key.as_str(), key.as_str())?;
        }

        let in_group = |s: &&VariableSummary| s.measurement_group == group;
        let grouped: Vec<VariableSummary> = grouped.iter().filter(in_group).cloned().collect();
        let baseline: Vec<VariableSummary> = baseline.iter().filter(in_group).cloned().collect();

        let mut table =
            SummaryTable::from_summaries(&header, &grouped, &baseline, &self.config.baseline_label);

        if let (Some(key), Some(categorical)) =
            (self.config.id_keys.first(), self.config.categorical_column.as_deref())
        {
            let group_rows = long.rows.iter().filter(|r| r.measurement_group == group);
            let overall = Aggregator::sample_mode(group_rows, categorical);
            let by_group = match self.config.grouping_column.as_deref() {
                Some(column) if long.carries(column) => {
                    Aggregator::representative_by_group(long, categorical, column)
                }
                _ => IndexMap::new(),
            };
            table.fill_id_column(key, &by_group, overall);
        }

        Ok(TableFormatter::format(
            table,
            &header,
            self.config.language,
            &self.config.baseline_label,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryEntry;
    use crate::input::Value;
    use crate::rules::RuleRecord;
    use crate::table::{CellStyle, ROW_ID_KEY};
    use crate::validation::RuleKind;

    fn record(variable: &str, required: &str, data_type: &str, rule: &str) -> RuleRecord {
        RuleRecord {
            sheet: "Data".into(),
            variable: variable.into(),
            unique_by: "-".into(),
            required: required.into(),
            data_type: data_type.into(),
            description: String::new(),
            validation_rule: rule.into(),
        }
    }

    fn entry(column: &str, group: &str, abbr: &str, unit: &str) -> DictionaryEntry {
        DictionaryEntry {
            column_name: column.into(),
            measurement_group: group.into(),
            abbreviation: abbr.into(),
            unit: unit.into(),
            display_label: abbr.into(),
        }
    }

    fn pipeline() -> Pipeline {
        let rules = RuleRegistry::from_records(vec![
            record("sample_id", "true", "character", "no_duplicates"),
            record("producer_id", "true", "character", ""),
            record("year", "true", "integer", ">= 2000"),
        ])
        .unwrap();
        let dictionary = Dictionary::from_entries(vec![
            entry("texture", "Texture", "Texture", ""),
            entry("sand_pct", "Physical", "Sand", "%"),
            entry("clay_pct", "Physical", "Clay", "%"),
            entry("ph", "Chemical", "pH", ""),
        ]);
        Pipeline::new(PipelineConfig::default(), rules, dictionary)
    }

    fn dataset(rows: Vec<Vec<&str>>) -> Dataset {
        let headers = [
            "sample_id", "producer_id", "year", "field_id", "texture", "sand_pct", "clay_pct", "ph",
        ];
        Dataset::from_raw(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    #[test]
    fn test_valid_dataset_produces_tables() {
        let raw = dataset(vec![
            vec!["S1", "P1", "2021", "F1", "Loam", "40", "20", "6.0"],
            vec!["S2", "P1", "2021", "F1", "Loam", "42", "22", "6.4"],
            vec!["S3", "P2", "2022", "F2", "Clay", "20", "45", "7.2"],
        ]);
        let run = pipeline().run(&raw).unwrap();

        assert!(run.report.is_valid(), "{}", run.report.summary());
        let tables = run.tables.unwrap();
        assert!(tables.failures.is_empty());
        assert_eq!(tables.tables.keys().collect::<Vec<_>>(), vec!["Physical", "Chemical"]);

        let physical = &tables.tables["Physical"];
        assert_eq!(physical.body.columns, vec![ROW_ID_KEY, "Texture", "Sand", "Clay"]);
        assert_eq!(physical.body.row_count(), 3);
        assert_eq!(physical.body.rows[0][1], Value::Text("Loam".into()));
        assert_eq!(physical.body.rows[2][0], Value::Text("Project Average".into()));
        // F1 sand 41 vs baseline 34
        assert_eq!(physical.styles[0][2], CellStyle::AboveBaseline);
        assert_eq!(physical.styles[1][2], CellStyle::BelowBaseline);
        assert_eq!(physical.header.bottom.iter().filter(|c| c.span == 2).count(), 1);
    }

    #[test]
    fn test_missing_producer_halts_pipeline() {
        let headers = ["sample_id", "year", "ph"];
        let raw = Dataset::from_raw(
            headers.iter().map(|h| h.to_string()).collect(),
            vec![vec!["S1", "2021", "6.0"]],
        );
        let run = pipeline().run(&raw).unwrap();

        assert!(!run.report.is_valid());
        assert!(run
            .report
            .errors
            .iter()
            .any(|e| e.column == "producer_id" && e.rule == RuleKind::Required));
        assert!(run.tables.is_none());
    }

    #[test]
    fn test_early_year_fails_range_rule() {
        let raw = dataset(vec![
            vec!["S1", "P1", "1999", "F1", "Loam", "40", "20", "6.0"],
            vec!["S2", "P1", "2020", "F1", "Loam", "42", "22", "6.4"],
        ]);
        let run = pipeline().run(&raw).unwrap();

        let range: Vec<_> =
            run.report.errors.iter().filter(|e| e.rule == RuleKind::Range).collect();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].row_ids, vec!["S1"]);
    }

    #[test]
    fn test_unparsable_measurement_is_a_warning() {
        let raw = dataset(vec![
            vec!["S1", "P1", "2021", "F1", "Loam", "abc", "20", "6.0"],
            vec!["S2", "P1", "2021", "F1", "Loam", "12.5", "22", "6.4"],
        ]);
        let run = pipeline().run(&raw).unwrap();

        assert!(run.report.is_valid());
        assert_eq!(run.report.warnings.len(), 1);
        assert_eq!(run.report.warnings[0].original_value.as_deref(), Some("abc"));
        assert!(run.tables.is_some());
    }

    #[test]
    fn test_colliding_id_key_fails_only_that_group() {
        let mut p = pipeline();
        p.config.id_keys = vec!["pH".to_string()];
        let raw = dataset(vec![vec!["S1", "P1", "2021", "F1", "Loam", "40", "20", "6.0"]]);
        let tables = p.run(&raw).unwrap().tables.unwrap();

        assert!(tables.tables.contains_key("Physical"));
        assert_eq!(tables.failures.len(), 1);
        assert_eq!(tables.failures[0].group, "Chemical");
    }

    #[test]
    fn test_unknown_sheet_is_config_error() {
        let mut p = pipeline();
        p.config.sheet = "Other".to_string();
        let raw = dataset(vec![]);
        assert!(matches!(p.run(&raw), Err(SoilError::Config(_))));
    }

    #[test]
    fn test_config_json_defaults() {
        let config =
            PipelineConfig::from_json(r#"{"sheet": "Samples", "language": "es"}"#).unwrap();
        assert_eq!(config.sheet, "Samples");
        assert_eq!(config.language, Language::Spanish);
        assert_eq!(config.baseline_label, "Project Average");
        assert_eq!(config.grouping_column.as_deref(), Some("field_id"));
    }

    #[test]
    fn test_pipeline_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
