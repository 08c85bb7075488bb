//! Conditional backgrounds, unit-merged headers and footnotes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::header::HeaderSpec;
use super::summary_table::SummaryTable;
use crate::error::SoilError;
use crate::input::Value;

/// Background class of a body cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CellStyle {
    AboveBaseline,
    BelowBaseline,
    Neutral,
}

impl CellStyle {
    /// Applied to every body cell when no comparison is possible.
    pub const FALLBACK: CellStyle = CellStyle::Neutral;

    pub fn class_name(&self) -> &'static str {
        match self {
            CellStyle::AboveBaseline => "above-baseline",
            CellStyle::BelowBaseline => "below-baseline",
            CellStyle::Neutral => "neutral",
        }
    }
}

/// Footnote language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl FromStr for Language {
    type Err = SoilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "es" | "spanish" | "español" | "espanol" => Ok(Language::Spanish),
            other => Err(SoilError::Config(format!("unsupported language '{}'", other))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::English => "en",
            Language::Spanish => "es",
        })
    }
}

/// Text for one background class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootnoteClass {
    pub style: CellStyle,
    pub text: String,
}

/// Caption and legend describing the background classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    pub language: Language,
    pub caption: String,
    pub classes: Vec<FootnoteClass>,
}

impl Footnote {
    pub fn new(language: Language, baseline_label: &str) -> Self {
        let (caption, above, below) = match language {
            Language::English => (
                format!("Cells are shaded by comparison with the {} row.", baseline_label),
                format!("At or above the {}", baseline_label),
                format!("Below the {}", baseline_label),
            ),
            Language::Spanish => (
                format!(
                    "Las celdas se colorean según su comparación con la fila {}.",
                    baseline_label
                ),
                format!("Igual o superior a {}", baseline_label),
                format!("Inferior a {}", baseline_label),
            ),
        };

        Self {
            language,
            caption,
            classes: vec![
                FootnoteClass {
                    style: CellStyle::AboveBaseline,
                    text: above,
                },
                FootnoteClass {
                    style: CellStyle::BelowBaseline,
                    text: below,
                },
            ],
        }
    }
}

/// A horizontal merge over header columns `start..start + span`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSpan {
    pub start: usize,
    pub span: usize,
    pub unit: String,
}

/// One header cell, possibly spanning several columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCell {
    pub text: String,
    pub start: usize,
    pub span: usize,
    /// Draw a rule beneath the cell (set on merged unit cells).
    pub rule_below: bool,
}

impl HeaderCell {
    fn single(text: impl Into<String>, start: usize) -> Self {
        Self {
            text: text.into(),
            start,
            span: 1,
            rule_below: false,
        }
    }
}

/// Top (labels) and bottom (units) header rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRows {
    pub top: Vec<HeaderCell>,
    pub bottom: Vec<HeaderCell>,
}

/// A table ready for the document renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedTable {
    pub header: HeaderRows,
    pub body: SummaryTable,
    /// One style per body cell, same shape as `body.rows`.
    pub styles: Vec<Vec<CellStyle>>,
    pub footnote: Footnote,
}

/// Builds presentation tables.
pub struct TableFormatter;

impl TableFormatter {
    /// Assemble styles, merged headers and footnote for a finished table.
    pub fn format(
        table: SummaryTable,
        header: &HeaderSpec,
        language: Language,
        baseline_label: &str,
    ) -> FormattedTable {
        FormattedTable {
            header: Self::header_rows(header),
            styles: Self::conditional_styles(&table, header),
            body: table,
            footnote: Footnote::new(language, baseline_label),
        }
    }

    /// Classify every body cell against the last (baseline) row.
    pub fn conditional_styles(table: &SummaryTable, header: &HeaderSpec) -> Vec<Vec<CellStyle>> {
        let width = table.columns.len();
        let fallback = || vec![vec![CellStyle::FALLBACK; width]; table.rows.len()];

        if table.rows.len() < 2 {
            return fallback();
        }

        let numeric: Vec<bool> = (0..width)
            .map(|col| {
                !header.is_id(&table.columns[col])
                    && table.rows.iter().any(|row| number(row.get(col)).is_some())
            })
            .collect();
        if !numeric.contains(&true) {
            return fallback();
        }

        let baseline_idx = table.rows.len() - 1;
        let baseline = &table.rows[baseline_idx];

        table
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                (0..width)
                    .map(|col| {
                        if row_idx == baseline_idx || !numeric[col] {
                            return CellStyle::Neutral;
                        }
                        match (number(row.get(col)), number(baseline.get(col))) {
                            (Some(value), Some(base)) if value >= base => CellStyle::AboveBaseline,
                            (Some(_), Some(_)) => CellStyle::BelowBaseline,
                            _ => CellStyle::Neutral,
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Adjacent non-ID columns sharing a non-empty unit, two or more wide.
    pub fn unit_merges(header: &HeaderSpec) -> Vec<MergeSpan> {
        let mut spans = Vec::new();
        let mut run: Option<MergeSpan> = None;

        for (idx, row) in header.rows.iter().enumerate() {
            let eligible = !header.is_id(&row.key) && !row.unit.is_empty();
            match run.as_mut() {
                Some(current) if eligible && current.unit == row.unit => current.span += 1,
                _ => {
                    spans.extend(run.take().filter(|r| r.span > 1));
                    if eligible {
                        run = Some(MergeSpan {
                            start: idx,
                            span: 1,
                            unit: row.unit.clone(),
                        });
                    }
                }
            }
        }
        spans.extend(run.filter(|r| r.span > 1));
        spans
    }

    /// Label row plus unit row with merged cells.
    pub fn header_rows(header: &HeaderSpec) -> HeaderRows {
        let top = header
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| HeaderCell::single(row.abbr.as_str(), idx))
            .collect();

        let merges = Self::unit_merges(header);
        let mut bottom = Vec::new();
        let mut idx = 0;
        while idx < header.rows.len() {
            match merges.iter().find(|m| m.start == idx) {
                Some(merge) => {
                    bottom.push(HeaderCell {
                        text: merge.unit.clone(),
                        start: idx,
                        span: merge.span,
                        rule_below: true,
                    });
                    idx += merge.span;
                }
                None => {
                    bottom.push(HeaderCell::single(header.rows[idx].unit.as_str(), idx));
                    idx += 1;
                }
            }
        }

        HeaderRows { top, bottom }
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => Some(*n),
        _ => None,
    }
}
