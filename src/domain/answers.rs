//! Raw answer sets submitted against the questionnaire.
//!
//! A `RawAnswerSet` maps 1-based item ordinals to Likert values in [1,5].
//! It is created once per submission and never mutated afterwards. Missing
//! ordinals are allowed here; the scoring engine defaults them to the scale
//! midpoint. Malformed values are rejected at construction, per field, so the
//! typed answer set guarantees in-range values downstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::questionnaire::QuestionnaireSchema;

/// Lowest valid Likert answer.
pub const SCALE_MIN: u8 = 1;
/// Highest valid Likert answer.
pub const SCALE_MAX: u8 = 5;
/// Default substituted for missing answers during scoring.
pub const SCALE_MIDPOINT: u8 = 3;

/// Errors raised while building an answer set from submitted values.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnswerError {
    #[error("answer q{ordinal} value {value} is outside the 1-5 scale")]
    OutOfScale { ordinal: usize, value: u8 },

    #[error("malformed answer fields: {}", .0.join(", "))]
    Malformed(Vec<String>),
}

/// Per-submission raw answers: scored ordinals, unscored supplemental
/// ordinals (role-specific items), and an optional free-text field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAnswerSet {
    answers: BTreeMap<usize, u8>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    supplemental: BTreeMap<usize, u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    problems: Option<String>,
}

impl RawAnswerSet {
    /// An empty answer set, used for externally imported records that carry
    /// no item-level trace.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from an ordered slice of values; index `i` becomes ordinal `i + 1`.
    ///
    /// # Errors
    /// Returns `OutOfScale` for the first value outside [1,5].
    pub fn from_values(values: &[u8]) -> Result<Self, AnswerError> {
        let mut answers = BTreeMap::new();
        for (i, &value) in values.iter().enumerate() {
            let ordinal = i + 1;
            if !(SCALE_MIN..=SCALE_MAX).contains(&value) {
                return Err(AnswerError::OutOfScale { ordinal, value });
            }
            answers.insert(ordinal, value);
        }
        Ok(Self {
            answers,
            supplemental: BTreeMap::new(),
            problems: None,
        })
    }

    /// Parse wire-shaped form fields (`q1`..`qN`, `problems`).
    ///
    /// Ordinals beyond the schema's scored range are kept in the supplemental
    /// map; they appear in the persisted payload but are never scored. Fields
    /// that are non-numeric or out of scale are collected and reported
    /// together; there is no partial result.
    ///
    /// # Errors
    /// Returns `Malformed` listing every offending field.
    pub fn from_form<I, K, V>(schema: &QuestionnaireSchema, fields: I) -> Result<Self, AnswerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let scored_max = schema.item_count();
        let mut answers = BTreeMap::new();
        let mut supplemental = BTreeMap::new();
        let mut problems = None;
        let mut malformed = Vec::new();

        for (key, value) in fields {
            let key = key.as_ref();
            let value = value.as_ref();

            if key == "problems" {
                if !value.trim().is_empty() {
                    problems = Some(value.trim().to_string());
                }
                continue;
            }

            let Some(ordinal) = key.strip_prefix('q').and_then(|s| s.parse::<usize>().ok()) else {
                // Non-answer fields (csrf tokens etc.) are the caller's business.
                continue;
            };

            match value.trim().parse::<u8>() {
                Ok(v) if ordinal >= 1 && (SCALE_MIN..=SCALE_MAX).contains(&v) => {
                    if ordinal <= scored_max {
                        answers.insert(ordinal, v);
                    } else {
                        supplemental.insert(ordinal, v);
                    }
                }
                _ => malformed.push(format!("{key}={value}")),
            }
        }

        if !malformed.is_empty() {
            return Err(AnswerError::Malformed(malformed));
        }

        Ok(Self {
            answers,
            supplemental,
            problems,
        })
    }

    /// Attach the free-text field.
    #[must_use]
    pub fn with_problems(mut self, problems: impl Into<String>) -> Self {
        let text = problems.into();
        if !text.trim().is_empty() {
            self.problems = Some(text);
        }
        self
    }

    /// Answer for a scored ordinal, if present.
    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<u8> {
        self.answers.get(&ordinal).copied()
    }

    /// Scored ordinals present in this set, ascending.
    pub fn scored_ordinals(&self) -> impl Iterator<Item = usize> + '_ {
        self.answers.keys().copied()
    }

    /// Number of scored answers present.
    #[must_use]
    pub fn answered_len(&self) -> usize {
        self.answers.len()
    }

    /// Supplemental (unscored) answers, keyed by ordinal.
    #[must_use]
    pub fn supplemental(&self) -> &BTreeMap<usize, u8> {
        &self.supplemental
    }

    /// Free-text problems field, if provided.
    #[must_use]
    pub fn problems(&self) -> Option<&str> {
        self.problems.as_deref()
    }

    /// True when no scored or supplemental answers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty() && self.supplemental.is_empty()
    }
}
