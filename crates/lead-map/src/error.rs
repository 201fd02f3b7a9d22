//! Error types for mapping operations.

use std::time::Duration;

use thiserror::Error;

/// Errors from building mapping components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// A matcher needs at least one field to choose from.
    #[error("no candidate fields supplied to the matcher")]
    NoCandidateFields,
}

/// Why an external suggestion could not be used.
///
/// Every variant is recovered inside the mapping engine by falling back to
/// the deterministic matcher; none of them reach the mapping caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unavailable {
    #[error("no suggestion provider configured")]
    NotConfigured,
    #[error("suggestion request failed: {0}")]
    Transport(String),
    #[error("suggestion request timed out after {0:?}")]
    Timeout(Duration),
    #[error("suggestion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("suggestion service returned no text")]
    EmptyResponse,
    #[error("suggestion was not a JSON object: {0}")]
    Malformed(String),
}
