//! Typed representation of declarative validation rules.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SoilError};

/// `<op> <literal>` with an optional sign and decimal part.
static COMPARISON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(>=|<=|==|!=|>|<)\s*(-?\d+(?:\.\d+)?)$").expect("static regex is valid")
});

/// Expected type of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Whole numbers.
    Integer,
    /// Free text; every value conforms.
    Character,
    /// Any finite number.
    Numeric,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Character => "character",
            DataType::Numeric => "numeric",
        }
    }
}

impl FromStr for DataType {
    type Err = SoilError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(DataType::Integer),
            "character" | "string" | "text" => Ok(DataType::Character),
            "numeric" | "number" | "double" => Ok(DataType::Numeric),
            other => Err(SoilError::Config(format!("unknown data_type '{}'", other))),
        }
    }
}

/// Comparison operator of a range check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ComparisonOp {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            ">=" => ComparisonOp::Ge,
            "<=" => ComparisonOp::Le,
            ">" => ComparisonOp::Gt,
            "<" => ComparisonOp::Lt,
            "==" => ComparisonOp::Eq,
            "!=" => ComparisonOp::Ne,
            _ => return None,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Ge => ">=",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Lt => "<",
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
        }
    }
}

/// A comparison against a numeric literal, e.g. `>= 2000`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub op: ComparisonOp,
    pub literal: f64,
}

impl Comparison {
    /// Whether `value` satisfies the comparison.
    pub fn holds(&self, value: f64) -> bool {
        match self.op {
            ComparisonOp::Ge => value >= self.literal,
            ComparisonOp::Le => value <= self.literal,
            ComparisonOp::Gt => value > self.literal,
            ComparisonOp::Lt => value < self.literal,
            ComparisonOp::Eq => value == self.literal,
            ComparisonOp::Ne => value != self.literal,
        }
    }

    /// Parse `<op> <literal>`; `None` if the token is not a comparison.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = COMPARISON_RE.captures(token.trim())?;
        let op = ComparisonOp::parse(&caps[1])?;
        let literal = caps[2].parse::<f64>().ok()?;
        Some(Self { op, literal })
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.symbol(), crate::input::Value::Number(self.literal))
    }
}

/// One typed check derived from a rule at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCheck {
    /// `required = true`: no missing values, column must exist.
    Required,
    /// Values must conform to the declared type.
    Type { data_type: DataType },
    /// Every non-missing value must satisfy the comparison.
    Range { comparison: Comparison },
    /// Combinations of `columns` must not repeat.
    Uniqueness { columns: Vec<String> },
    /// `not_empty`: no missing values, independent of `required`.
    NonEmpty,
}

/// A validation rule for one variable of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub sheet: String,
    pub variable: String,
    /// Key columns for uniqueness; `None` when the source says `-`.
    pub unique_by: Option<Vec<String>>,
    pub required: bool,
    pub data_type: DataType,
    pub description: String,
    /// The expression as written in the rule table.
    pub expression: String,
    /// Checks parsed from the fields above, in evaluation order.
    pub checks: Vec<RuleCheck>,
}

impl ValidationRule {
    /// Build a rule, parsing `expression` into typed checks.
    pub fn new(
        sheet: impl Into<String>,
        variable: impl Into<String>,
        unique_by: Option<Vec<String>>,
        required: bool,
        data_type: DataType,
        description: impl Into<String>,
        expression: impl Into<String>,
    ) -> Result<Self> {
        let variable = variable.into();
        let expression = expression.into();

        let mut checks = Vec::new();
        if required {
            checks.push(RuleCheck::Required);
        }
        if data_type != DataType::Character {
            checks.push(RuleCheck::Type { data_type });
        }
        checks.extend(parse_expression(&expression, &variable, unique_by.as_deref())?);

        Ok(Self {
            sheet: sheet.into(),
            variable,
            unique_by,
            required,
            data_type,
            description: description.into(),
            expression,
            checks,
        })
    }
}

/// Parse a `validation_rule` cell into checks.
///
/// Accepts an empty string, a comparison (`>= 2000`), or comma-separated
/// tokens drawn from `not_empty`, `no_duplicates` and comparisons.
fn parse_expression(
    expression: &str,
    variable: &str,
    unique_by: Option<&[String]>,
) -> Result<Vec<RuleCheck>> {
    let mut checks = Vec::new();

    for token in expression.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let check = match token {
            "not_empty" => RuleCheck::NonEmpty,
            "no_duplicates" => RuleCheck::Uniqueness {
                columns: unique_by
                    .map(<[String]>::to_vec)
                    .unwrap_or_else(|| vec![variable.to_string()]),
            },
            other => match Comparison::parse(other) {
                Some(comparison) => RuleCheck::Range { comparison },
                None => {
                    return Err(SoilError::Config(format!(
                        "unrecognized validation rule '{}' for variable '{}'",
                        other, variable
                    )));
                }
            },
        };
        if !checks.contains(&check) {
            checks.push(check);
        }
    }

    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(expression: &str, unique_by: Option<Vec<String>>) -> Result<ValidationRule> {
        ValidationRule::new("Data", "year", unique_by, false, DataType::Character, "", expression)
    }

    #[test]
    fn test_parse_comparison() {
        let c = Comparison::parse(">= 2000").unwrap();
        assert_eq!(c.op, ComparisonOp::Ge);
        assert_eq!(c.literal, 2000.0);
        assert!(c.holds(2000.0));
        assert!(!c.holds(1999.0));
        assert_eq!(c.to_string(), ">= 2000");

        assert_eq!(Comparison::parse("<-1.5").unwrap().literal, -1.5);
        assert!(Comparison::parse("=> 5").is_none());
        assert!(Comparison::parse(">= abc").is_none());
    }

    #[test]
    fn test_expression_tokens() {
        let r = rule("no_duplicates, not_empty", Some(vec!["sample_id".into()])).unwrap();
        assert_eq!(
            r.checks,
            vec![
                RuleCheck::Uniqueness { columns: vec!["sample_id".into()] },
                RuleCheck::NonEmpty,
            ]
        );
    }

    #[test]
    fn test_no_duplicates_defaults_to_variable() {
        let r = rule("no_duplicates", None).unwrap();
        assert_eq!(r.checks, vec![RuleCheck::Uniqueness { columns: vec!["year".into()] }]);
    }

    #[test]
    fn test_empty_expression_has_no_checks() {
        assert!(rule("", None).unwrap().checks.is_empty());
    }

    #[test]
    fn test_unknown_token_is_config_error() {
        let err = rule("is_positive", None).unwrap_err();
        assert!(matches!(err, SoilError::Config(msg) if msg.contains("is_positive")));
    }

    #[test]
    fn test_required_and_type_checks_come_first() {
        let r = ValidationRule::new("Data", "year", None, true, DataType::Integer, "", ">= 2000")
            .unwrap();
        assert_eq!(r.checks[0], RuleCheck::Required);
        assert_eq!(r.checks[1], RuleCheck::Type { data_type: DataType::Integer });
        assert!(matches!(r.checks[2], RuleCheck::Range { .. }));
    }

    #[test]
    fn test_data_type_from_str() {
        assert_eq!("Integer".parse::<DataType>().unwrap(), DataType::Integer);
        assert_eq!("numeric".parse::<DataType>().unwrap(), DataType::Numeric);
        assert!("date".parse::<DataType>().is_err());
    }
}
