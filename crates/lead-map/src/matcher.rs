//! Single-column matcher.
//!
//! Picks exactly one candidate field for a column name, trying in order:
//!
//! 1. fuzzy similarity of the normalized names, returning the first field
//!    whose score exceeds [`CONFIDENCE_THRESHOLD`];
//! 2. content sniffing over up to five sample values;
//! 3. keyword substrings of the normalized name;
//! 4. the best fuzzy score seen in step 1, however low.
//!
//! Step 1 is greedy: a later candidate with a higher score never displaces an
//! earlier one that already crossed the threshold. Candidates are enumerated
//! required-first, so this favors required fields.

use serde::{Deserialize, Serialize};
use tracing::trace;

use lead_model::{Category, Field, SAMPLE_VALUES_PER_COLUMN};

use crate::error::MapError;
use crate::patterns::{ContentKind, KEYWORDS};
use crate::similarity::ratio;
use crate::utils::normalize_name;

/// A fuzzy score strictly above this returns immediately.
pub const CONFIDENCE_THRESHOLD: f64 = 0.82;

/// Which step of the matcher decided a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Fuzzy,
    Content,
    Keyword,
    Default,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::Fuzzy => "fuzzy",
            MatchStage::Content => "content",
            MatchStage::Keyword => "keyword",
            MatchStage::Default => "default",
        }
    }
}

/// A field and its fuzzy score against a column name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub field: Field,
    pub score: f64,
}

/// The chosen field plus how it was chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    pub field: Field,
    pub stage: MatchStage,
    /// Fuzzy score of the crossing field, or the best one seen otherwise.
    pub score: f64,
}

/// Matcher over a fixed, non-empty list of candidate fields.
#[derive(Debug, Clone)]
pub struct Matcher {
    candidates: Vec<(Field, String)>,
}

impl Matcher {
    /// Builds a matcher; enumeration order is the order of `fields`.
    pub fn new(fields: &[Field]) -> Result<Self, MapError> {
        if fields.is_empty() {
            return Err(MapError::NoCandidateFields);
        }
        Ok(Self::from_fields(fields.iter().copied()))
    }

    /// Matcher over the required then optional fields of a category.
    pub fn for_category(category: Category) -> Self {
        Self::from_fields(category.fields().candidates())
    }

    fn from_fields(fields: impl Iterator<Item = Field>) -> Self {
        Self {
            candidates: fields
                .map(|field| (field, normalize_name(field.as_str())))
                .collect(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.candidates.iter().map(|(field, _)| *field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.candidates.iter().any(|(candidate, _)| *candidate == field)
    }

    /// Returns the best-fit candidate for a column.
    pub fn best_match(&self, column: &str, samples: Option<&[String]>) -> Field {
        self.explain(column, samples).field
    }

    /// Same as [`Self::best_match`] but reports the deciding stage.
    pub fn explain(&self, column: &str, samples: Option<&[String]>) -> MatchOutcome {
        let clean = normalize_name(column);

        let (first_field, _) = &self.candidates[0];
        let mut best = MatchCandidate {
            field: *first_field,
            score: 0.0,
        };
        for (field, normalized) in &self.candidates {
            let score = ratio(&clean, normalized);
            if score > best.score {
                best = MatchCandidate {
                    field: *field,
                    score,
                };
            }
            if score > CONFIDENCE_THRESHOLD {
                trace!(column, field = %field, score, "fuzzy threshold crossed");
                return MatchOutcome {
                    field: *field,
                    stage: MatchStage::Fuzzy,
                    score,
                };
            }
        }

        if let Some(values) = samples
            && let Some(field) = self.sniff_content(values)
        {
            return MatchOutcome {
                field,
                stage: MatchStage::Content,
                score: best.score,
            };
        }

        if let Some(field) = self.keyword_match(&clean) {
            return MatchOutcome {
                field,
                stage: MatchStage::Keyword,
                score: best.score,
            };
        }

        MatchOutcome {
            field: best.field,
            stage: MatchStage::Default,
            score: best.score,
        }
    }

    /// Scores every candidate, highest first; ties keep enumeration order.
    pub fn ranked(&self, column: &str) -> Vec<MatchCandidate> {
        let clean = normalize_name(column);
        let mut scored: Vec<MatchCandidate> = self
            .candidates
            .iter()
            .map(|(field, normalized)| MatchCandidate {
                field: *field,
                score: ratio(&clean, normalized),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    fn sniff_content(&self, values: &[String]) -> Option<Field> {
        let present: Vec<&str> = values
            .iter()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .take(SAMPLE_VALUES_PER_COLUMN)
            .collect();
        if present.is_empty() {
            return None;
        }
        let text = present.join(" ").to_lowercase();
        ContentKind::ORDERED
            .iter()
            .filter(|kind| kind.detect(&text))
            .find_map(|kind| {
                kind.targets()
                    .iter()
                    .copied()
                    .find(|target| self.contains(*target))
            })
    }

    fn keyword_match(&self, clean: &str) -> Option<Field> {
        KEYWORDS
            .iter()
            .filter(|(field, _)| self.contains(*field))
            .find(|(_, keywords)| keywords.iter().any(|keyword| clean.contains(keyword)))
            .map(|(field, _)| *field)
    }
}

/// Picks the best-fit field for one column from `candidates`.
///
/// Fails only when `candidates` is empty.
pub fn best_match(
    column: &str,
    candidates: &[Field],
    samples: Option<&[String]>,
) -> Result<Field, MapError> {
    Ok(Matcher::new(candidates)?.best_match(column, samples))
}
