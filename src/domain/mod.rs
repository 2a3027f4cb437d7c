//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types and pure computation with no I/O.
//! All types are serializable and validate their inputs.

mod answers;
mod questionnaire;
mod record;
mod respondent;
pub mod scoring;

pub use answers::{AnswerError, RawAnswerSet, SCALE_MAX, SCALE_MIDPOINT, SCALE_MIN};
pub use questionnaire::{role_supplements, Construct, Item, Polarity, QuestionnaireSchema, ScoreDomain};
pub use record::{ConstructScore, DomainScores, ScoredRecord, StressBand, SurveyScores};
pub use respondent::{Respondent, DEFAULT_POSITION};
pub use scoring::ScoringError;
