//! Two-row header specs (label + unit) built from the data dictionary.

use serde::{Deserialize, Serialize};

use crate::dictionary::Dictionary;
use crate::error::DictionaryError;

/// Key of the synthetic row-identity column.
pub const ROW_ID_KEY: &str = "Field or Average";

/// Keys that are always treated as ID columns.
pub const DEFAULT_ID_KEYS: &[&str] = &[ROW_ID_KEY, "Texture"];

/// One column of a header: top label, join key, bottom label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSpecRow {
    pub abbr: String,
    pub key: String,
    pub unit: String,
}

impl HeaderSpecRow {
    pub fn new(abbr: impl Into<String>, key: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            abbr: abbr.into(),
            key: key.into(),
            unit: unit.into(),
        }
    }
}

/// Ordered header rows; ID columns first, then measurements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSpec {
    pub rows: Vec<HeaderSpecRow>,
    /// Keys of the rows that identify a table row rather than a measurement.
    pub id_keys: Vec<String>,
}

impl HeaderSpec {
    /// Append an ID column after the existing ID columns.
    ///
    /// Fails when `key` is already used by a measurement or another ID
    /// column; the caller must resolve the clash instead.
    pub fn with_id_column(
        mut self,
        abbr: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, DictionaryError> {
        let key = key.into();
        if self.rows.iter().any(|r| r.key == key) {
            return Err(DictionaryError::KeyCollision { key });
        }
        let position = self.id_keys.len();
        self.rows.insert(position, HeaderSpecRow::new(abbr, key.clone(), ""));
        self.id_keys.push(key);
        Ok(self)
    }

    /// Whether `key` is an ID column (never formatted or unit-merged).
    pub fn is_id(&self, key: &str) -> bool {
        self.id_keys.iter().any(|k| k == key) || DEFAULT_ID_KEYS.contains(&key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.key.as_str()).collect()
    }

    /// Keys of measurement columns, in header order.
    pub fn measurement_keys(&self) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| !self.is_id(&r.key))
            .map(|r| r.key.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds [`HeaderSpec`]s from a dictionary.
pub struct HeaderMapper;

impl HeaderMapper {
    /// Header for one measurement group: the synthetic ID row followed by
    /// one row per measurement (abbr = key = abbreviation).
    pub fn map(dictionary: &Dictionary, group: &str) -> Result<HeaderSpec, DictionaryError> {
        let mut rows = vec![HeaderSpecRow::new(ROW_ID_KEY, ROW_ID_KEY, "")];

        for entry in dictionary.entries_in_group(group) {
            let key = entry.abbreviation.as_str();
            if key == ROW_ID_KEY {
                return Err(DictionaryError::KeyCollision {
                    key: key.to_string(),
                });
            }
            if rows.iter().any(|r| r.key == key) {
                return Err(DictionaryError::DuplicateKey {
                    group: group.to_string(),
                    key: key.to_string(),
                });
            }
            rows.push(HeaderSpecRow::new(key, key, entry.unit.as_str()));
        }

        if rows.len() == 1 {
            return Err(DictionaryError::UnknownGroup {
                group: group.to_string(),
                available: dictionary.groups().into_iter().map(String::from).collect(),
            });
        }

        Ok(HeaderSpec {
            rows,
            id_keys: vec![ROW_ID_KEY.to_string()],
        })
    }
}
