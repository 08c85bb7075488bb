//! Numeric coercion of measurement columns.

mod cleaner;

pub use cleaner::{CleanOutput, Cleaner, CoercionWarning};
