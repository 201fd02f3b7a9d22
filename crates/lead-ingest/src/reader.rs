use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use tracing::{debug, warn};

use lead_model::Table;

use crate::error::{IngestError, Result};

/// Bytes inspected when guessing the delimiter.
pub const SNIFF_BYTES: usize = 10_000;
pub const DEFAULT_MAX_ROWS: usize = 2000;
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b'\t', b';'];
const UNNAMED_PREFIX: &str = "Unnamed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Data rows kept after the header.
    pub max_rows: usize,
    /// Forces a delimiter instead of sniffing one.
    pub delimiter: Option<u8>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            delimiter: None,
        }
    }
}

/// Reads an uploaded delimited file into a [`Table`].
///
/// The first non-empty record is the header. Blank and `Unnamed*` headers
/// are dropped with their cells, repeated headers get a `.N` suffix, and
/// rows are padded or cut to the header width.
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<Table> {
    let bytes = fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&bytes, path, options)
}

/// Same as [`read_table`] for bytes already in memory; `origin` only
/// labels errors.
pub fn parse_table(bytes: &[u8], origin: &Path, options: &ReadOptions) -> Result<Table> {
    let text = decode(bytes);
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| sniff_delimiter(text.as_bytes()));
    debug!(origin = %origin.display(), delimiter = %char::from(delimiter), "reading table");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: origin.to_path_buf(),
            source,
        })?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        if header.is_none() {
            header = Some(record.iter().map(normalize_header).collect());
            continue;
        }
        if raw_rows.len() >= options.max_rows {
            break;
        }
        raw_rows.push(record.iter().map(normalize_cell).collect());
    }

    let raw_header = header.unwrap_or_default();
    let kept: Vec<usize> = raw_header
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && !name.starts_with(UNNAMED_PREFIX))
        .map(|(idx, _)| idx)
        .collect();
    if kept.is_empty() {
        return Err(IngestError::NoColumns(PathBuf::from(origin)));
    }
    let dropped = raw_header.len() - kept.len();
    if dropped > 0 {
        warn!(dropped, "dropped unnamed columns");
    }

    let headers = dedupe_headers(kept.iter().map(|idx| raw_header[*idx].clone()));
    let mut table = Table::new(headers);
    for raw in raw_rows {
        let row = kept
            .iter()
            .map(|idx| raw.get(*idx).cloned().unwrap_or_default())
            .collect();
        table.push_row(row);
    }
    debug!(
        columns = table.headers.len(),
        rows = table.row_count(),
        "table read"
    );
    Ok(table)
}

/// Most frequent of `,`, tab and `;` in the first [`SNIFF_BYTES`] bytes.
/// Ties keep that order; no candidates at all means a comma.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let window = &bytes[..bytes.len().min(SNIFF_BYTES)];
    let mut best = (CANDIDATE_DELIMITERS[0], 0usize);
    for candidate in CANDIDATE_DELIMITERS {
        let count = window.iter().filter(|byte| **byte == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// UTF-8 with the BOM removed. Files that are not valid UTF-8 are read as
/// Windows-1252, the usual encoding of spreadsheet exports, which accepts
/// every byte.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, had_errors) = WINDOWS_1252.decode_without_bom_handling(bytes);
            debug!(had_errors, "input is not UTF-8; decoded as windows-1252");
            text.into_owned()
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().to_string()
}

fn dedupe_headers(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    names
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                name
            } else {
                format!("{name}.{}", *count - 1)
            }
        })
        .collect()
}
