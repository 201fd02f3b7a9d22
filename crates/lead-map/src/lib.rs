//! Column mapping for buyer and visitor uploads.
//!
//! [`MappingEngine`] assigns every uploaded column one field of the
//! category's taxonomy. An optional [`SuggestionProvider`] proposes a whole
//! mapping first; the [`Matcher`] decides whatever the provider left out or
//! got wrong, so a complete mapping is always produced.

#![deny(unsafe_code)]

pub mod assistant;
pub mod engine;
pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod locate;
pub mod matcher;
pub mod patterns;
pub mod repository;
pub mod similarity;
pub mod suggest;
pub mod utils;
pub mod values;

pub use assistant::{answer_question, build_question_prompt};
pub use engine::{ColumnDecision, MappingEngine, MappingOrigin, MappingResult, suggest_mapping};
pub use error::{MapError, Unavailable};
#[cfg(feature = "gemini")]
pub use gemini::GeminiProvider;
pub use locate::{ColumnLocator, ColumnRole, Demographics};
pub use matcher::{
    CONFIDENCE_THRESHOLD, MatchCandidate, MatchOutcome, MatchStage, Matcher, best_match,
};
pub use repository::{MappingMetadata, MappingRepository, StoredMapping};
pub use suggest::{
    Suggestion, SuggestionOptions, SuggestionProvider, build_prompt, extract_json,
    parse_suggestion, request_suggestion,
};
pub use values::{parse_amount, parse_date};
