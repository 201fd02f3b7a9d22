use std::path::PathBuf;

use serde::Serialize;

use lead_ingest::DataSummary;
use lead_map::{ColumnRole, MappingResult};
use lead_model::{Category, Field, Table};

/// An uploaded file read into memory.
#[derive(Debug, Clone)]
pub struct Upload {
    pub path: PathBuf,
    pub category: Category,
    pub table: Table,
}

/// Everything the `suggest` command reports for one file.
#[derive(Debug, Clone, Serialize)]
pub struct MappingReport {
    pub file: PathBuf,
    pub rows: usize,
    pub confidence: f64,
    #[serde(flatten)]
    pub result: MappingResult,
    pub missing_required: Vec<Field>,
    pub saved_to: Option<PathBuf>,
}

/// A report role and the upload column that fills it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocatedColumn {
    pub role: ColumnRole,
    pub column: String,
}

/// Where the mapping used to locate report columns came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    /// Confirmed earlier and loaded from the repository.
    Saved,
    /// Computed from the upload by the matcher.
    Matcher,
}

impl MappingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingSource::Saved => "saved",
            MappingSource::Matcher => "matcher",
        }
    }
}

/// Output of the `summary` command.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub summary: DataSummary,
    pub mapping_source: MappingSource,
    pub located: Vec<LocatedColumn>,
    pub date_column: Option<String>,
}

/// Output of the `ask` command.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReport {
    pub workspace: String,
    pub question: String,
    pub context: String,
    pub answer: Option<String>,
}
