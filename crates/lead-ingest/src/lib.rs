#![deny(unsafe_code)]

pub mod error;
pub mod reader;
pub mod store;
pub mod summary;

pub use error::{IngestError, Result};
pub use reader::{DEFAULT_MAX_ROWS, ReadOptions, parse_table, read_table, sniff_delimiter};
pub use store::{InMemorySummaryStore, NO_DATA_CONTEXT, StoreOptions, SummaryStore};
pub use summary::{
    CategoricalStats, ColumnKind, ColumnSummary, DataSummary, NumericStats, ValueCount,
};
