//! Input parsing and dataset representation.

mod parser;
mod source;

pub use parser::{Parser, ParserConfig};
pub use source::{Dataset, SourceMetadata, Value};
