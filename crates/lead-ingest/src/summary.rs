//! Compact descriptions of an uploaded table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use lead_model::{Category, Table};

pub const SAMPLE_ROWS: usize = 10;
pub const SUMMARIZED_COLUMNS: usize = 20;
pub const SAMPLE_VALUES: usize = 3;
pub const MAX_STAT_COLUMNS: usize = 10;
/// Text columns with this many distinct values or more get no top list.
pub const MAX_CATEGORIES: usize = 50;
pub const TOP_VALUES: usize = 5;

/// Column names listed in a context block before the rest are counted.
pub const CONTEXT_COLUMNS: usize = 15;
/// Numeric and categorical columns described per context block.
pub const CONTEXT_STAT_COLUMNS: usize = 5;
/// Top values quoted per categorical column.
pub const CONTEXT_TOP_VALUES: usize = 3;
/// Sample records quoted per context block.
pub const CONTEXT_RECORDS: usize = 3;
/// Fields shown per sample record.
pub const CONTEXT_RECORD_FIELDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Every non-empty cell parses as a number.
    Numeric,
    Text,
    /// No non-empty cells.
    Empty,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub unique: usize,
    pub nulls: usize,
    pub samples: Vec<String>,
}

impl fmt::Display for ColumnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column '{}' ({}): {} unique values",
            self.name,
            self.kind.as_str(),
            self.unique
        )?;
        if self.nulls > 0 {
            write!(f, ", {} nulls", self.nulls)?;
        }
        if !self.samples.is_empty() {
            write!(f, ". Sample: {}", self.samples.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalStats {
    pub column: String,
    pub unique: usize,
    /// Most frequent values, ties in first-seen order.
    pub top: Vec<ValueCount>,
}

/// Everything kept about one upload after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub category: Category,
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns: Vec<String>,
    /// First rows, cells aligned with `columns`.
    pub sample_rows: Vec<Vec<String>>,
    pub column_summaries: Vec<ColumnSummary>,
    pub numeric: Vec<NumericStats>,
    pub categorical: Vec<CategoricalStats>,
}

impl DataSummary {
    pub fn from_table(category: Category, table: &Table) -> Self {
        let kinds: Vec<ColumnKind> = table
            .headers
            .iter()
            .map(|header| column_kind(table, header))
            .collect();

        let column_summaries = table
            .headers
            .iter()
            .zip(&kinds)
            .take(SUMMARIZED_COLUMNS)
            .map(|(header, kind)| ColumnSummary {
                name: header.clone(),
                kind: *kind,
                unique: distinct(table, header).len(),
                nulls: table
                    .column_values(header)
                    .filter(|value| value.trim().is_empty())
                    .count(),
                samples: table
                    .non_empty_values(header)
                    .take(SAMPLE_VALUES)
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        let numeric = table
            .headers
            .iter()
            .zip(&kinds)
            .filter(|(_, kind)| **kind == ColumnKind::Numeric)
            .take(MAX_STAT_COLUMNS)
            .filter_map(|(header, _)| numeric_stats(table, header))
            .collect();

        let categorical = table
            .headers
            .iter()
            .zip(&kinds)
            .filter(|(_, kind)| **kind == ColumnKind::Text)
            .take(MAX_STAT_COLUMNS)
            .filter_map(|(header, _)| categorical_stats(table, header))
            .collect();

        Self {
            category,
            total_rows: table.row_count(),
            total_columns: table.headers.len(),
            columns: table.headers.clone(),
            sample_rows: table.rows.iter().take(SAMPLE_ROWS).cloned().collect(),
            column_summaries,
            numeric,
            categorical,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.column_summaries
            .iter()
            .find(|summary| summary.name == name)
    }

    /// Renders the summary as a plain-text block for a question prompt.
    ///
    /// Lists the columns, up to [`CONTEXT_STAT_COLUMNS`] numeric and
    /// categorical columns with their statistics, and the first
    /// [`CONTEXT_RECORDS`] records.
    pub fn to_context(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== {} Data ===", category_title(self.category));
        let _ = writeln!(out, "Total Records: {}", group_thousands(self.total_rows));
        let _ = writeln!(out, "Total Columns: {}", self.total_columns);
        let listed: Vec<&str> = self
            .columns
            .iter()
            .take(CONTEXT_COLUMNS)
            .map(String::as_str)
            .collect();
        let _ = write!(out, "Columns: {}", listed.join(", "));
        if self.columns.len() > CONTEXT_COLUMNS {
            let _ = write!(out, " ... and {} more", self.columns.len() - CONTEXT_COLUMNS);
        }
        out.push_str("\n\n");

        out.push_str("Key Statistics:\n");
        if !self.numeric.is_empty() {
            out.push_str("Numeric Columns:\n");
            for stats in self.numeric.iter().take(CONTEXT_STAT_COLUMNS) {
                let _ = writeln!(
                    out,
                    "  - {}: min={:.2}, max={:.2}, mean={:.2}, sum={:.2}",
                    stats.column, stats.min, stats.max, stats.mean, stats.sum
                );
            }
        }
        if !self.categorical.is_empty() {
            out.push_str("\nCategorical Columns:\n");
            for stats in self.categorical.iter().take(CONTEXT_STAT_COLUMNS) {
                let _ = writeln!(out, "  - {}: {} unique values", stats.column, stats.unique);
                let top: Vec<String> = stats
                    .top
                    .iter()
                    .take(CONTEXT_TOP_VALUES)
                    .map(|entry| format!("{} ({})", entry.value, entry.count))
                    .collect();
                if !top.is_empty() {
                    let _ = writeln!(out, "    Top values: {}", top.join(", "));
                }
            }
        }

        if !self.sample_rows.is_empty() {
            let _ = writeln!(out, "\nSample Records (first {CONTEXT_RECORDS}):");
            for (idx, row) in self.sample_rows.iter().take(CONTEXT_RECORDS).enumerate() {
                let fields: Vec<String> = self
                    .columns
                    .iter()
                    .zip(row)
                    .take(CONTEXT_RECORD_FIELDS)
                    .map(|(column, value)| format!("{column}={value}"))
                    .collect();
                let _ = writeln!(out, "Record {}: {}", idx + 1, fields.join(", "));
            }
        }
        out
    }
}

fn category_title(category: Category) -> &'static str {
    match category {
        Category::Buyers => "Buyers",
        Category::Visitors => "Visitors",
    }
}

/// `1234567` as `1,234,567`.
fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

fn column_kind(table: &Table, header: &str) -> ColumnKind {
    let mut values = table.non_empty_values(header).peekable();
    if values.peek().is_none() {
        return ColumnKind::Empty;
    }
    if values.all(|value| value.parse::<f64>().is_ok_and(f64::is_finite)) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

fn distinct<'a>(table: &'a Table, header: &str) -> BTreeSet<&'a str> {
    table.non_empty_values(header).collect()
}

fn numeric_stats(table: &Table, header: &str) -> Option<NumericStats> {
    let mut values: Vec<f64> = table
        .non_empty_values(header)
        .filter_map(|value| value.parse().ok())
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let sum: f64 = values.iter().sum();
    let median = if count % 2 == 1 {
        values[count / 2]
    } else {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    };
    Some(NumericStats {
        column: header.to_string(),
        min: values[0],
        max: values[count - 1],
        mean: sum / count as f64,
        median,
        sum,
    })
}

fn categorical_stats(table: &Table, header: &str) -> Option<CategoricalStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in table.non_empty_values(header) {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }
    if counts.len() >= MAX_CATEGORIES {
        return None;
    }
    let mut top: Vec<ValueCount> = order
        .into_iter()
        .map(|value| ValueCount {
            value: value.to_string(),
            count: counts[value],
        })
        .collect();
    // Stable sort keeps first-seen order among ties.
    top.sort_by(|a, b| b.count.cmp(&a.count));
    top.truncate(TOP_VALUES);
    Some(CategoricalStats {
        column: header.to_string(),
        unique: counts.len(),
        top,
    })
}
