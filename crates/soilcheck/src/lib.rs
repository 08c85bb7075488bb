//! Soilcheck: validation, aggregation and report tables for soil health datasets.
//!
//! A raw upload flows through a fixed sequence of stages, each taking
//! immutable inputs and returning new outputs:
//!
//! 1. [`Cleaner`] coerces measurement columns to numbers and records warnings
//! 2. [`ValidationEngine`] applies the declarative rules from a [`RuleRegistry`]
//! 3. [`Aggregator`] summarizes the long-format data
//! 4. [`HeaderMapper`] and [`TableFormatter`] build render-ready tables
//!
//! # Example
//!
//! ```no_run
//! use soilcheck::{Dictionary, Parser, Pipeline, PipelineConfig, RuleRegistry};
//!
//! let rules = RuleRegistry::from_path("rules.csv").unwrap();
//! let dictionary = Dictionary::from_path("dictionary.csv").unwrap();
//! let (dataset, _source) = Parser::new().parse_file("data.csv").unwrap();
//!
//! let pipeline = Pipeline::new(PipelineConfig::default(), rules, dictionary);
//! let run = pipeline.run(&dataset).unwrap();
//!
//! println!("Errors: {}", run.report.errors.len());
//! ```

pub mod aggregate;
pub mod clean;
pub mod dictionary;
pub mod error;
pub mod input;
pub mod rules;
pub mod table;
pub mod validation;

mod pipeline;

pub use crate::pipeline::{GroupFailure, Pipeline, PipelineConfig, PipelineRun, ReportTables};
pub use aggregate::{Aggregator, LongFormat, LongFormatRow, ProjectSummary, VariableSummary};
pub use clean::{CleanOutput, Cleaner, CoercionWarning};
pub use dictionary::{Dictionary, DictionaryEntry};
pub use error::{DictionaryError, Result, SoilError};
pub use input::{Dataset, Parser, ParserConfig, SourceMetadata, Value};
pub use rules::{Comparison, DataType, RuleCheck, RuleRegistry, ValidationRule};
pub use table::{
    CellStyle, FormattedTable, HeaderMapper, HeaderSpec, HeaderSpecRow, Language, SummaryTable,
    TableFormatter,
};
pub use validation::{RuleKind, ValidationEngine, ValidationIssue, ValidationReport};
