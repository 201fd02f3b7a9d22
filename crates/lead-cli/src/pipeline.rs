//! Steps shared by the subcommands: read an upload, map its columns,
//! summarize it, persist the outcome and answer questions about it.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span, trace, warn};

use lead_ingest::{DataSummary, ReadOptions, SummaryStore, read_table};
use lead_map::{
    ColumnLocator, ColumnRole, MappingEngine, MappingRepository, SuggestionOptions,
    SuggestionProvider, answer_question, suggest_mapping,
};
use lead_model::{Category, ColumnMapping, Field, SAMPLE_VALUES_PER_COLUMN};

use crate::logging::redact_samples;
use crate::types::{LocatedColumn, MappingReport, MappingSource, SummaryReport, Upload};

pub fn load_upload(path: &Path, category: Category, options: &ReadOptions) -> Result<Upload> {
    let table = read_table(path, options)
        .with_context(|| format!("Failed to read upload {}", path.display()))?;
    info!(
        file = %path.display(),
        category = %category,
        rows = table.row_count(),
        columns = table.headers.len(),
        "upload read"
    );
    Ok(Upload {
        path: path.to_path_buf(),
        category,
        table,
    })
}

/// Engine for `category`, consulting the hosted model when `suggestion`
/// is given and usable. Without one the matcher decides every column.
pub fn build_engine(category: Category, suggestion: Option<&SuggestionOptions>) -> MappingEngine {
    let engine = MappingEngine::new(category);
    match suggestion.and_then(suggestion_provider) {
        Some(provider) => engine.with_provider(provider),
        None => engine,
    }
}

/// Hosted model client for `options`, or `None` when no key is set or the
/// client cannot be built.
#[cfg(feature = "gemini")]
pub fn suggestion_provider(options: &SuggestionOptions) -> Option<Box<dyn SuggestionProvider>> {
    use lead_map::{GeminiProvider, Unavailable};

    match GeminiProvider::new(options) {
        Ok(provider) => {
            debug!(model = %options.model, "suggestion service enabled");
            Some(Box::new(provider))
        }
        Err(Unavailable::NotConfigured) => {
            debug!("no API key; mapping with the matcher only");
            None
        }
        Err(err) => {
            warn!(error = %err, "suggestion service unavailable; mapping with the matcher only");
            None
        }
    }
}

#[cfg(not(feature = "gemini"))]
pub fn suggestion_provider(_options: &SuggestionOptions) -> Option<Box<dyn SuggestionProvider>> {
    debug!("built without a suggestion service; mapping with the matcher only");
    None
}

/// Maps every column of `upload`.
pub fn map_upload(upload: &Upload, engine: &MappingEngine) -> MappingReport {
    let span = info_span!(
        "map",
        file = %upload.path.display(),
        category = %upload.category
    );
    let _guard = span.enter();
    let start = Instant::now();

    for column in &upload.table.headers {
        if let Some(sample) = upload
            .table
            .column_sample(column, SAMPLE_VALUES_PER_COLUMN)
        {
            trace!(column = %column, samples = %redact_samples(&sample.values), "column sample");
        }
    }

    let result = engine.suggest(&upload.table.headers, Some(&upload.table));
    let missing_required = result.missing_required();
    if !missing_required.is_empty() {
        let names: Vec<&str> = missing_required.iter().map(Field::as_str).collect();
        warn!(missing = %names.join(", "), "required fields not mapped");
    }
    info!(
        columns = result.decisions.len(),
        confidence = result.confidence(),
        duration_ms = start.elapsed().as_millis(),
        "upload mapped"
    );

    MappingReport {
        file: upload.path.clone(),
        rows: upload.table.row_count(),
        confidence: result.confidence(),
        result,
        missing_required,
        saved_to: None,
    }
}

/// Summarizes `upload`, keeps the summary in `store` for `workspace` and
/// locates the columns reports read.
///
/// `saved` is the mapping confirmed for this workspace and category, if any.
pub fn summarize_upload(
    upload: &Upload,
    workspace: &str,
    store: &dyn SummaryStore,
    saved: Option<&ColumnMapping>,
) -> SummaryReport {
    let summary = DataSummary::from_table(upload.category, &upload.table);
    store.put(workspace, summary.clone());
    debug!(
        workspace,
        numeric = summary.numeric.len(),
        categorical = summary.categorical.len(),
        "upload summarized"
    );
    let date_column = ColumnLocator::new(&upload.table)
        .find_date_column()
        .map(str::to_string);
    SummaryReport {
        summary,
        mapping_source: if saved.is_some() {
            MappingSource::Saved
        } else {
            MappingSource::Matcher
        },
        located: locate_columns(upload, saved),
        date_column,
    }
}

/// Column for each report role.
///
/// Columns are first looked up through `saved`, or through the matcher's
/// mapping of the upload when nothing was saved, then by name.
pub fn locate_columns(upload: &Upload, saved: Option<&ColumnMapping>) -> Vec<LocatedColumn> {
    let suggested;
    let mapping = match saved {
        Some(mapping) => mapping,
        None => {
            suggested =
                suggest_mapping(&upload.table.headers, upload.category, Some(&upload.table));
            &suggested
        }
    };
    let locator = ColumnLocator::new(&upload.table).with_mapping(mapping);
    ColumnRole::ALL
        .into_iter()
        .filter_map(|role| {
            locator.find(role).map(|column| LocatedColumn {
                role,
                column: column.to_string(),
            })
        })
        .collect()
}

/// Mapping saved for `workspace` and `category` under `dir`.
///
/// A missing directory means nothing was ever saved; it is not created.
pub fn load_saved_mapping(
    dir: &Path,
    workspace: &str,
    category: Category,
) -> Result<Option<ColumnMapping>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "no mapping repository");
        return Ok(None);
    }
    let repository = MappingRepository::new(dir)?;
    let saved = repository
        .load(workspace, category)
        .with_context(|| format!("Failed to load saved mapping for workspace {workspace}"))?;
    match &saved {
        Some(mapping) => info!(workspace, columns = mapping.len(), "using saved mapping"),
        None => debug!(workspace, category = %category, "no saved mapping; using the matcher"),
    }
    Ok(saved)
}

/// Summarizes every upload into `store` and returns the workspace's
/// question context.
pub fn build_context(uploads: &[Upload], workspace: &str, store: &dyn SummaryStore) -> String {
    for upload in uploads {
        store.put(
            workspace,
            DataSummary::from_table(upload.category, &upload.table),
        );
    }
    let context = store.context_for(workspace);
    debug!(
        workspace,
        uploads = uploads.len(),
        chars = context.chars().count(),
        "question context built"
    );
    context
}

/// Answers `question` over `context` with the hosted model.
pub fn ask_question(
    provider: &dyn SuggestionProvider,
    question: &str,
    context: &str,
) -> Result<String> {
    let start = Instant::now();
    let answer = answer_question(provider, question, context)
        .with_context(|| format!("{} could not answer the question", provider.name()))?;
    info!(
        provider = provider.name(),
        duration_ms = start.elapsed().as_millis(),
        "question answered"
    );
    Ok(answer)
}

/// Writes the report's mapping to the repository and records where.
pub fn save_report(
    repository: &MappingRepository,
    workspace: &str,
    report: &mut MappingReport,
) -> Result<PathBuf> {
    let path = repository
        .save(workspace, report.result.category, &report.result.mapping)
        .with_context(|| format!("Failed to save mapping for workspace {workspace}"))?;
    info!(workspace, path = %path.display(), "mapping saved");
    report.saved_to = Some(path.clone());
    Ok(path)
}
