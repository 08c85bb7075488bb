//! Error types for the soilcheck library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for soilcheck operations.
#[derive(Debug, Error)]
pub enum SoilError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Malformed or missing rule/pipeline configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A table lacks columns it structurally requires.
    #[error("{table} is missing required columns: {}", columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    /// Dictionary lookup or header construction failed.
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while mapping dictionary entries to table headers.
///
/// These are fatal for the table of one measurement group only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DictionaryError {
    /// The dictionary source lacks columns needed to build headers.
    #[error("Data dictionary is missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// The requested group has no dictionary rows.
    #[error(
        "No dictionary rows for measurement group '{group}'. Available groups: {}",
        available.join(", ")
    )]
    UnknownGroup {
        group: String,
        available: Vec<String>,
    },

    /// Two measurements in one group share an abbreviation.
    #[error("Duplicate header key '{key}' in measurement group '{group}'")]
    DuplicateKey { group: String, key: String },

    /// An ID column shares its key with a measurement column.
    #[error("ID column '{key}' collides with a measurement of the same name")]
    KeyCollision { key: String },
}

/// Result type alias for soilcheck operations.
pub type Result<T> = std::result::Result<T, SoilError>;
