use serde::{Deserialize, Serialize};

/// Number of values the matcher inspects when sniffing column content.
pub const SAMPLE_VALUES_PER_COLUMN: usize = 5;

/// Parsed rows of an uploaded file, all cells kept as text.
///
/// Rows are padded or truncated to the header width by the reader, but
/// accessors here tolerate ragged rows anyway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Iterates every cell of a column, including empty ones.
    pub fn column_values(&self, name: &str) -> impl Iterator<Item = &str> {
        let idx = self.column_index(name);
        self.rows.iter().filter_map(move |row| {
            let idx = idx?;
            Some(row.get(idx).map(String::as_str).unwrap_or(""))
        })
    }

    /// Iterates the trimmed, non-empty cells of a column.
    pub fn non_empty_values(&self, name: &str) -> impl Iterator<Item = &str> {
        self.column_values(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Builds a sample of up to `limit` non-empty values for a column.
    ///
    /// Returns `None` when the column does not exist.
    pub fn column_sample(&self, name: &str, limit: usize) -> Option<ColumnSample> {
        self.column_index(name)?;
        Some(ColumnSample {
            name: name.to_string(),
            values: self
                .non_empty_values(name)
                .take(limit)
                .map(str::to_string)
                .collect(),
        })
    }
}

/// A column name with a handful of representative values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSample {
    pub name: String,
    pub values: Vec<String>,
}

impl ColumnSample {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
