//! Long-format pivot and summary aggregation.

mod long;
mod summary;

pub use long::{LongFormat, LongFormatRow, PivotColumns};
pub use summary::{Aggregator, MISSING_GROUP, ProjectSummary, VariableSummary, mode};
