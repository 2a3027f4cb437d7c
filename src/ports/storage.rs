//! Storage port: Trait for persistent storage operations.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use crate::domain::{Respondent, ScoredRecord};

/// Trait for respondent and scored-record persistence.
pub trait Storage: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Find a respondent by username.
    ///
    /// This is the existence check bulk import relies on for idempotency.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn find_respondent(&self, username: &str) -> Result<Option<Respondent>, Self::Error>;

    /// Insert a new respondent. Usernames are unique.
    ///
    /// # Errors
    /// Returns error if storage operation fails or the username exists.
    fn insert_respondent(&self, respondent: &Respondent) -> Result<(), Self::Error>;

    /// Total number of respondents.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_respondents(&self) -> Result<usize, Self::Error>;

    /// Save a scored record.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_record(&self, record: &ScoredRecord) -> Result<(), Self::Error>;

    /// Most recent record for one respondent.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn latest_record_for(&self, respondent_id: &str) -> Result<Option<ScoredRecord>, Self::Error>;

    /// Most recent records across all respondents (up to `limit`).
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn recent_records(&self, limit: usize) -> Result<Vec<ScoredRecord>, Self::Error>;

    /// Total number of scored records.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_records(&self) -> Result<usize, Self::Error>;

    /// Every record joined with its respondent, newest first. Input for the
    /// analytics aggregates.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn records_with_respondents(&self) -> Result<Vec<(Respondent, ScoredRecord)>, Self::Error>;

    /// Delete bulk-imported respondents (`csv_user_` prefix) and their
    /// records. Returns the number of respondents removed.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn delete_imported(&self) -> Result<usize, Self::Error>;
}
