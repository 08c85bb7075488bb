//! Declarative validation rules and the registry that loads them.

mod registry;
mod types;

pub use registry::{RuleRecord, RuleRegistry};
pub use types::{Comparison, ComparisonOp, DataType, RuleCheck, ValidationRule};
