//! Validation engine applying declarative rules to a dataset.

mod report;
mod validators;

pub use report::{RuleKind, ValidationIssue, ValidationReport};
pub use validators::{
    NonEmptyValidator, RangeValidator, RequiredValidator, RowIdentifiers, TypeValidator,
    UniquenessValidator, ValidationEngine, Validator,
};
