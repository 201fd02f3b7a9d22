//! Mapping orchestration.
//!
//! The engine asks an optional [`SuggestionProvider`] for a whole-file
//! mapping, keeps the entries that name a valid field of the category, and
//! fills every other column with the deterministic [`Matcher`]. The result
//! always covers every distinct input column.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use lead_model::{Category, ColumnMapping, Field, SAMPLE_VALUES_PER_COLUMN, Table};

use crate::matcher::{MatchStage, Matcher};
use crate::suggest::{Suggestion, SuggestionProvider, request_suggestion};

/// Where a column's field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingOrigin {
    /// Accepted from the external suggestion.
    Suggested,
    /// Decided by the matcher at the given stage.
    Fallback(MatchStage),
}

impl MappingOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            MappingOrigin::Suggested => "suggested",
            MappingOrigin::Fallback(stage) => stage.as_str(),
        }
    }

    pub fn is_suggested(&self) -> bool {
        matches!(self, MappingOrigin::Suggested)
    }
}

impl fmt::Display for MappingOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One column's final assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDecision {
    pub column: String,
    pub field: Field,
    pub origin: MappingOrigin,
}

/// Output of [`MappingEngine::suggest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub category: Category,
    pub mapping: ColumnMapping,
    /// One entry per distinct column, in input order.
    pub decisions: Vec<ColumnDecision>,
    /// Provider consulted, if any.
    pub provider: Option<String>,
}

impl MappingResult {
    fn empty(category: Category, provider: Option<String>) -> Self {
        Self {
            category,
            mapping: ColumnMapping::new(),
            decisions: Vec::new(),
            provider,
        }
    }

    /// Share of columns taken from the suggestion, as a percentage rounded
    /// to one decimal. Zero when there are no columns.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.decisions.is_empty() {
            return 0.0;
        }
        let suggested = self.suggested_count() as f64;
        let pct = suggested / self.decisions.len() as f64 * 100.0;
        (pct * 10.0).round() / 10.0
    }

    #[must_use]
    pub fn suggested_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|decision| decision.origin.is_suggested())
            .count()
    }

    /// Number of columns decided by each origin.
    #[must_use]
    pub fn stage_counts(&self) -> BTreeMap<MappingOrigin, usize> {
        let mut counts = BTreeMap::new();
        for decision in &self.decisions {
            *counts.entry(decision.origin).or_insert(0) += 1;
        }
        counts
    }

    pub fn origin(&self, column: &str) -> Option<MappingOrigin> {
        self.decisions
            .iter()
            .find(|decision| decision.column == column)
            .map(|decision| decision.origin)
    }

    /// Required fields of the category that no column maps to.
    #[must_use]
    pub fn missing_required(&self) -> Vec<Field> {
        self.category
            .fields()
            .required
            .iter()
            .copied()
            .filter(|field| self.mapping.columns_for(*field).next().is_none())
            .collect()
    }
}

/// Maps uploaded columns onto a category's fields.
pub struct MappingEngine {
    category: Category,
    matcher: Matcher,
    provider: Option<Box<dyn SuggestionProvider>>,
}

impl fmt::Debug for MappingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingEngine")
            .field("category", &self.category)
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .finish_non_exhaustive()
    }
}

impl MappingEngine {
    /// Engine with the matcher only.
    pub fn new(category: Category) -> Self {
        Self {
            category,
            matcher: Matcher::for_category(category),
            provider: None,
        }
    }

    /// Consults `provider` once per [`Self::suggest`] call.
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn SuggestionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Maps every distinct column in `columns`.
    ///
    /// Never fails: provider problems are logged and the matcher fills in.
    /// A repeated column name keeps its first decision.
    pub fn suggest(&self, columns: &[String], samples: Option<&Table>) -> MappingResult {
        let provider_name = self.provider.as_ref().map(|p| p.name().to_string());
        if columns.is_empty() {
            return MappingResult::empty(self.category, provider_name);
        }

        let suggestion = self.fetch_suggestion(columns, samples);
        let mut result = MappingResult::empty(self.category, provider_name);

        for column in columns {
            if result.mapping.contains_column(column) {
                warn!(column = %column, "duplicate column name; keeping first mapping");
                continue;
            }
            let (field, origin) = match self.accept_suggested(&suggestion, column) {
                Some(field) => (field, MappingOrigin::Suggested),
                None => {
                    let values = samples
                        .and_then(|table| table.column_sample(column, SAMPLE_VALUES_PER_COLUMN))
                        .map(|sample| sample.values);
                    let outcome = self.matcher.explain(column, values.as_deref());
                    (outcome.field, MappingOrigin::Fallback(outcome.stage))
                }
            };
            debug!(column = %column, field = %field, origin = %origin, "column mapped");
            result.mapping.insert(column.clone(), field);
            result.decisions.push(ColumnDecision {
                column: column.clone(),
                field,
                origin,
            });
        }

        info!(
            category = %self.category,
            columns = result.decisions.len(),
            suggested = result.suggested_count(),
            confidence = result.confidence(),
            "mapping suggested"
        );
        result
    }

    fn fetch_suggestion(&self, columns: &[String], samples: Option<&Table>) -> Suggestion {
        let Some(provider) = self.provider.as_deref() else {
            return Suggestion::new();
        };
        match request_suggestion(provider, columns, self.category, samples) {
            Ok(suggestion) => suggestion,
            Err(err) => {
                warn!(
                    provider = provider.name(),
                    error = %err,
                    "suggestion unavailable; using matcher for all columns"
                );
                Suggestion::new()
            }
        }
    }

    fn accept_suggested(&self, suggestion: &Suggestion, column: &str) -> Option<Field> {
        let Value::String(name) = suggestion.get(column)? else {
            return None;
        };
        let field = name.parse::<Field>().ok()?;
        self.matcher.contains(field).then_some(field)
    }
}

/// Maps `columns` for `category` with the matcher only.
pub fn suggest_mapping(
    columns: &[String],
    category: Category,
    samples: Option<&Table>,
) -> ColumnMapping {
    MappingEngine::new(category).suggest(columns, samples).mapping
}
