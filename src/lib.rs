//! # Workpulse
//!
//! Workplace stress & productivity survey scoring and prediction engine.
//!
//! This crate provides:
//! - Likert-scale questionnaire scoring into per-construct and composite scores
//! - Bulk normalization of external survey datasets onto the same construct set
//! - Productivity projection from the stress composite via pre-trained models
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (questionnaire schema, answers, scoring, records)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (SQLite, model artifacts)
//! - `application`: Use cases orchestrating domain and ports

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use domain::{QuestionnaireSchema, RawAnswerSet, ScoredRecord, StressBand};

/// Result type for Workpulse operations
pub type Result<T> = std::result::Result<T, WorkpulseError>;

/// Main error type for Workpulse
#[derive(Debug, thiserror::Error)]
pub enum WorkpulseError {
    #[error("Scoring failed: {0}")]
    Scoring(#[from] domain::ScoringError),

    #[error("Invalid submission: {0}")]
    Answers(#[from] domain::AnswerError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Normalization failed: {0}")]
    Normalize(#[from] application::NormalizeError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
