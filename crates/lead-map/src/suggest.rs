//! External mapping suggestions.
//!
//! A [`SuggestionProvider`] turns a prompt into free text. This module builds
//! the prompt, pulls the JSON object back out of the reply and parses it into
//! a raw `column -> value` map. Validation against the taxonomy happens in the
//! engine, which treats every failure here as "no suggestion".

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use lead_model::{Category, Table};

use crate::error::Unavailable;
use crate::utils::truncate_value;

/// Columns that get sample values in the prompt.
pub const PROMPT_SAMPLE_COLUMNS: usize = 12;
/// Sample values shown per column.
pub const PROMPT_SAMPLE_ROWS: usize = 3;
/// Longest sample value shown before it is cut.
pub const PROMPT_VALUE_MAX_CHARS: usize = 70;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Raw suggestion as returned by the provider, not yet validated.
pub type Suggestion = BTreeMap<String, Value>;

/// Something that can answer a mapping prompt.
///
/// Implementations make at most one bounded attempt per call.
pub trait SuggestionProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Sends `prompt` and returns the reply text.
    fn complete(&self, prompt: &str) -> Result<String, Unavailable>;
}

/// Settings for the hosted suggestion service.
#[derive(Clone)]
pub struct SuggestionOptions {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for SuggestionOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// Keeps the key out of debug output.
impl fmt::Debug for SuggestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestionOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SuggestionOptions {
    /// Defaults plus the API key from [`API_KEY_ENV`], if set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Sets the key; blank keys count as absent.
    #[must_use]
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// True when a key is present.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Builds the mapping prompt for `columns`.
///
/// Sample values come from the first rows of `samples` for at most
/// [`PROMPT_SAMPLE_COLUMNS`] columns that exist in the table.
pub fn build_prompt(columns: &[String], category: Category, samples: Option<&Table>) -> String {
    let fields = category.fields();
    let required: Vec<&str> = fields.required.iter().map(|f| f.as_str()).collect();
    let optional: Vec<&str> = fields.optional.iter().map(|f| f.as_str()).collect();

    let mut prompt = format!(
        "Map CSV columns to standard fields. File type: **{category}**.\n\n\
         Columns: {}\n\n\
         Standard fields (required): {}\n\
         Standard fields (optional): {}\n\n\
         Rules:\n\
         - Map by **meaning**, not exact name.\n\
         - Multiple columns → same field is allowed.\n\
         - **Never return null** – always pick a valid field.\n\
         - Use sample data to infer content.\n\n",
        json_list(columns.iter().map(String::as_str)),
        json_list(required.iter().copied()),
        json_list(optional.iter().copied()),
    );

    if let Some(table) = samples.filter(|table| table.row_count() > 0) {
        prompt.push_str("Sample rows (first 3):\n");
        for column in columns.iter().take(PROMPT_SAMPLE_COLUMNS) {
            if table.column_index(column).is_none() {
                continue;
            }
            let values: Vec<String> = table
                .column_values(column)
                .take(PROMPT_SAMPLE_ROWS)
                .map(|value| truncate_value(value, PROMPT_VALUE_MAX_CHARS))
                .collect();
            prompt.push_str(&format!(
                "{column}: {}\n",
                json_list(values.iter().map(String::as_str))
            ));
        }
    }

    prompt.push_str(&format!(
        "\nReturn **only JSON** mapping **all {}** columns:\n{{ \"COL\": \"field\", ... }}\n",
        columns.len()
    ));
    prompt
}

fn json_list<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<&str> = items.collect();
    serde_json::to_string(&items).unwrap_or_default()
}

/// Pulls the JSON payload out of a free-text reply.
///
/// Tries a ```` ```json ```` fence, then any fence, then the outermost
/// `{...}` slice, then the whole trimmed text.
pub fn extract_json(text: &str) -> &str {
    if let Some((_, rest)) = text.split_once("```json") {
        return fenced_body(rest);
    }
    if let Some((_, rest)) = text.split_once("```") {
        return fenced_body(rest);
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && start < end
    {
        return &text[start..=end];
    }
    text.trim()
}

fn fenced_body(rest: &str) -> &str {
    rest.split_once("```")
        .map_or(rest, |(body, _)| body)
        .trim()
}

/// Parses a reply into a raw suggestion; anything but a JSON object fails.
pub fn parse_suggestion(reply: &str) -> Result<Suggestion, Unavailable> {
    let payload = extract_json(reply);
    serde_json::from_str::<Suggestion>(payload).map_err(|err| Unavailable::Malformed(err.to_string()))
}

/// Asks `provider` once for a mapping of `columns`.
pub fn request_suggestion(
    provider: &dyn SuggestionProvider,
    columns: &[String],
    category: Category,
    samples: Option<&Table>,
) -> Result<Suggestion, Unavailable> {
    let prompt = build_prompt(columns, category, samples);
    debug!(
        provider = provider.name(),
        prompt_chars = prompt.chars().count(),
        "requesting mapping suggestion"
    );
    let reply = provider.complete(&prompt)?;
    if reply.trim().is_empty() {
        return Err(Unavailable::EmptyResponse);
    }
    parse_suggestion(&reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_prefers_json_fence() {
        let reply = "Here you go:\n```json\n{\"a\": \"email\"}\n```\nthanks";
        assert_eq!(extract_json(reply), "{\"a\": \"email\"}");
    }

    #[test]
    fn extract_accepts_bare_fence() {
        let reply = "```\n{\"a\": \"email\"}\n```";
        assert_eq!(extract_json(reply), "{\"a\": \"email\"}");
    }

    #[test]
    fn extract_finds_object_in_prose() {
        let reply = "Mapping: {\"a\": \"email\"} hope it helps";
        assert_eq!(extract_json(reply), "{\"a\": \"email\"}");
    }

    #[test]
    fn extract_falls_back_to_trimmed_text() {
        assert_eq!(extract_json("  not json  "), "not json");
    }

    #[test]
    fn unclosed_fence_takes_rest() {
        assert_eq!(extract_json("```json {\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn parse_rejects_non_objects() {
        assert!(matches!(
            parse_suggestion("[1, 2]"),
            Err(Unavailable::Malformed(_))
        ));
        assert!(matches!(
            parse_suggestion("sorry, I can't"),
            Err(Unavailable::Malformed(_))
        ));
    }

    #[test]
    fn parse_keeps_non_string_values() {
        let parsed = parse_suggestion(r#"{"A": null, "B": 3, "C": "email"}"#).unwrap();
        assert_eq!(parsed["A"], Value::Null);
        assert_eq!(parsed["C"], Value::String("email".into()));
    }

    #[test]
    fn blank_key_disables_provider() {
        let options = SuggestionOptions::default().with_api_key(Some("   ".into()));
        assert!(!options.is_enabled());
        let options = options.with_api_key(Some("k".into()));
        assert!(options.is_enabled());
        assert!(!format!("{options:?}").contains("\"k\""));
    }
}
