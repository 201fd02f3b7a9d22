//! Questions about uploaded data, answered by a [`SuggestionProvider`].
//!
//! The caller supplies the context text (see
//! `lead_ingest::SummaryStore::context_for`); this module only frames it.

use tracing::{debug, warn};

use crate::error::Unavailable;
use crate::suggest::SuggestionProvider;
use crate::utils::truncate_value;

/// Longest context passed to the provider, in characters.
pub const MAX_CONTEXT_CHARS: usize = 2000;
/// Marker appended after a cut context.
pub const TRUNCATION_NOTE: &str = "[Context truncated]";

/// Builds the analyst prompt for `question` over `context`.
///
/// Context longer than [`MAX_CONTEXT_CHARS`] is cut and followed by
/// [`TRUNCATION_NOTE`].
pub fn build_question_prompt(question: &str, context: &str) -> String {
    let length = context.chars().count();
    let context = if length > MAX_CONTEXT_CHARS {
        warn!(
            chars = length,
            limit = MAX_CONTEXT_CHARS,
            "question context truncated"
        );
        format!(
            "{}\n\n{TRUNCATION_NOTE}",
            truncate_value(context, MAX_CONTEXT_CHARS)
        )
    } else {
        context.to_string()
    };
    format!(
        "You are a helpful data analyst assistant. Answer the user's question \
         based on the provided data context.\n\n\
         USER QUESTION: {}\n\n\
         DATA CONTEXT:\n{context}\n\n\
         INSTRUCTIONS:\n\
         - Answer based ONLY on the data provided above\n\
         - Include specific numbers and statistics when relevant\n\
         - If the data doesn't contain information to answer the question, say so clearly\n\
         - Be concise but informative\n\
         - Format numbers with commas for readability\n\n\
         ANSWER:",
        question.trim()
    )
}

/// Asks `provider` once and returns the trimmed answer.
pub fn answer_question(
    provider: &dyn SuggestionProvider,
    question: &str,
    context: &str,
) -> Result<String, Unavailable> {
    let prompt = build_question_prompt(question, context);
    debug!(
        provider = provider.name(),
        prompt_chars = prompt.chars().count(),
        "asking question"
    );
    let reply = provider.complete(&prompt)?;
    let answer = reply.trim();
    if answer.is_empty() {
        return Err(Unavailable::EmptyResponse);
    }
    Ok(answer.to_string())
}
