//! Data dictionary: metadata for each measurement column.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DictionaryError, Result};
use crate::input::{Dataset, Parser, Value};

/// Dictionary source columns, with accepted aliases.
const COLUMN_NAME: &[&str] = &["column_name", "variable", "column"];
const GROUP: &[&str] = &["measurement_group", "group"];
const ABBR: &[&str] = &["abbr", "abbreviation"];
const UNIT: &[&str] = &["unit", "units"];
const LABEL: &[&str] = &["label", "display_label"];

/// Metadata for one measurement column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub column_name: String,
    pub measurement_group: String,
    pub abbreviation: String,
    /// Empty when the measurement is unitless.
    pub unit: String,
    pub display_label: String,
}

/// Mapping from measurement column name to its metadata, in source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dictionary {
    entries: IndexMap<String, DictionaryEntry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from entries. Later entries replace earlier ones
    /// with the same column name.
    pub fn from_entries(entries: impl IntoIterator<Item = DictionaryEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (e.column_name.clone(), e))
                .collect(),
        }
    }

    /// Load a dictionary from a delimited file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let (dataset, _) = Parser::new().parse_file(path)?;
        Self::from_dataset(&dataset)
    }

    /// Interpret a parsed "Data Dictionary" table.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let find = |aliases: &[&str]| {
            aliases.iter().find_map(|a| {
                dataset
                    .headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(a))
            })
        };

        let required = [
            ("column_name", find(COLUMN_NAME)),
            ("measurement_group", find(GROUP)),
            ("abbr", find(ABBR)),
            ("unit", find(UNIT)),
        ];
        let missing: Vec<String> = required
            .iter()
            .filter(|(_, idx)| idx.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DictionaryError::MissingColumns { missing }.into());
        }
        let [name_idx, group_idx, abbr_idx, unit_idx] = required.map(|(_, idx)| idx.unwrap_or(0));
        let label_idx = find(LABEL);

        let text = |row: usize, col: usize| {
            dataset
                .get(row, col)
                .and_then(Value::as_text)
                .unwrap_or_default()
        };

        let entries = (0..dataset.row_count())
            .filter(|&row| !text(row, name_idx).is_empty())
            .map(|row| {
                let abbreviation = match text(row, abbr_idx) {
                    abbr if abbr.is_empty() => text(row, name_idx),
                    abbr => abbr,
                };
                let display_label = label_idx
                    .map(|idx| text(row, idx))
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| abbreviation.clone());
                DictionaryEntry {
                    column_name: text(row, name_idx),
                    measurement_group: text(row, group_idx),
                    abbreviation,
                    unit: text(row, unit_idx),
                    display_label,
                }
            });

        Ok(Self::from_entries(entries))
    }

    pub fn get(&self, column: &str) -> Option<&DictionaryEntry> {
        self.entries.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.values()
    }

    /// Measurement groups in first-appearance order.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for entry in self.entries.values() {
            if !groups.contains(&entry.measurement_group.as_str()) {
                groups.push(&entry.measurement_group);
            }
        }
        groups
    }

    /// Entries belonging to one group, in dictionary order.
    pub fn entries_in_group<'a>(
        &'a self,
        group: &'a str,
    ) -> impl Iterator<Item = &'a DictionaryEntry> {
        self.entries
            .values()
            .filter(move |e| e.measurement_group == group)
    }

    /// Column names of every measurement.
    pub fn measurement_columns(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SoilError;

    fn parse(content: &str) -> Dataset {
        Parser::new().parse_bytes(content.as_bytes()).unwrap()
    }

    #[test]
    fn test_from_dataset() {
        let ds = parse(
            "column_name,measurement_group,abbr,unit,label\n\
             ph,Chemical,pH,,Soil pH\n\
             soc,Carbon,SOC,%,Soil organic carbon\n\
             sand,Physical,Sand,%,\n",
        );
        let dict = Dictionary::from_dataset(&ds).unwrap();

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.groups(), vec!["Chemical", "Carbon", "Physical"]);
        let ph = dict.get("ph").unwrap();
        assert_eq!(ph.abbreviation, "pH");
        assert_eq!(ph.unit, "");
        assert_eq!(dict.get("sand").unwrap().display_label, "Sand");
    }

    #[test]
    fn test_missing_columns_enumerated() {
        let ds = parse("column_name,measurement_group,label\nph,Chemical,Soil pH\n");
        let err = Dictionary::from_dataset(&ds).unwrap_err();
        match err {
            SoilError::Dictionary(DictionaryError::MissingColumns { missing }) => {
                assert_eq!(missing, vec!["abbr", "unit"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_aliases_and_blank_rows() {
        let ds = parse(
            "Variable,Group,Abbreviation,Units\n\
             ph,Chemical,pH,\n\
             ,Chemical,X,\n",
        );
        let dict = Dictionary::from_dataset(&ds).unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.entries_in_group("Chemical").count(), 1);
    }
}
