//! Render-ready report tables: headers, bodies and cell styles.

mod format;
mod header;
mod summary_table;

pub use format::{
    CellStyle, FormattedTable, Footnote, FootnoteClass, HeaderCell, HeaderRows, Language,
    MergeSpan, TableFormatter,
};
pub use header::{DEFAULT_ID_KEYS, HeaderMapper, HeaderSpec, HeaderSpecRow, ROW_ID_KEY};
pub use summary_table::SummaryTable;
