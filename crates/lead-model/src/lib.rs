#![deny(unsafe_code)]

pub mod error;
pub mod mapping;
pub mod table;
pub mod taxonomy;

pub use error::{ModelError, Result};
pub use mapping::{ColumnMapping, MappingEntry};
pub use table::{ColumnSample, SAMPLE_VALUES_PER_COLUMN, Table};
pub use taxonomy::{Category, Field, FieldSet, fields_for};
