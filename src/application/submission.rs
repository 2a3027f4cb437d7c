//! Submission service: the live scoring path.
//!
//! One submission flows through scoring, persistence, and prediction. The
//! whole pipeline is synchronous and shares no mutable state, so independent
//! submissions can run in parallel without coordination.

use std::sync::Arc;

use crate::application::prediction::{PredictionService, PredictionSet};
use crate::domain::{scoring, QuestionnaireSchema, RawAnswerSet, Respondent, ScoredRecord};
use crate::ports::Storage;
use crate::{Result, WorkpulseError};

/// Outcome of one live submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub record: ScoredRecord,
    pub predictions: PredictionSet,
}

/// Service for scoring and persisting live questionnaire submissions.
pub struct SubmissionService<S: Storage> {
    schema: QuestionnaireSchema,
    storage: Arc<S>,
    prediction: PredictionService,
}

impl<S> SubmissionService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new submission service.
    pub fn new(schema: QuestionnaireSchema, storage: Arc<S>, prediction: PredictionService) -> Self {
        Self {
            schema,
            storage,
            prediction,
        }
    }

    /// The questionnaire this service scores against.
    #[must_use]
    pub fn schema(&self) -> &QuestionnaireSchema {
        &self.schema
    }

    /// Find a respondent by username, creating one if absent.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn ensure_respondent(
        &self,
        username: &str,
        gender: Option<String>,
        department: Option<String>,
        position: Option<String>,
    ) -> Result<Respondent> {
        if let Some(existing) = self
            .storage
            .find_respondent(username)
            .map_err(|e| WorkpulseError::Storage(e.into()))?
        {
            return Ok(existing);
        }

        let respondent = Respondent::new(username).with_profile(gender, department, position);
        self.storage
            .insert_respondent(&respondent)
            .map_err(|e| WorkpulseError::Storage(e.into()))?;
        Ok(respondent)
    }

    /// Score an answer set, persist the record, and project productivity.
    ///
    /// A schema mismatch rejects this submission only; the hosting process
    /// and other submissions are unaffected.
    ///
    /// # Errors
    /// Returns error on schema mismatch or storage failure.
    pub fn submit(&self, respondent_id: &str, answers: RawAnswerSet) -> Result<SubmissionOutcome> {
        let scores = scoring::score(&self.schema, &answers)?;
        let record = ScoredRecord::new(respondent_id, scores, answers);

        self.storage
            .save_record(&record)
            .map_err(|e| WorkpulseError::Storage(e.into()))?;

        let predictions = self.prediction.predict(record.scores.stress.composite);

        tracing::info!(
            "Scored submission {}: stress={:.2} ({}), productivity={:.2}",
            record.id,
            record.scores.stress.composite,
            record.stress_band(),
            record.scores.productivity.composite,
        );

        Ok(SubmissionOutcome {
            record,
            predictions,
        })
    }

    /// Latest record for a respondent with fresh predictions, for display.
    ///
    /// # Errors
    /// Returns error if storage fails.
    pub fn latest_with_predictions(
        &self,
        respondent_id: &str,
    ) -> Result<Option<(ScoredRecord, PredictionSet)>> {
        let Some(record) = self
            .storage
            .latest_record_for(respondent_id)
            .map_err(|e| WorkpulseError::Storage(e.into()))?
        else {
            return Ok(None);
        };

        let predictions = self.prediction.predict(record.scores.stress.composite);
        Ok(Some((record, predictions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifacts::{LinearArtifact, PredictionArtifacts, ScalerArtifact};
    use crate::adapters::sqlite::SqliteStorage;
    use crate::domain::ScoringError;

    fn service_with(
        artifacts: PredictionArtifacts,
    ) -> (SubmissionService<SqliteStorage>, Arc<SqliteStorage>) {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let service = SubmissionService::new(
            QuestionnaireSchema::standard(),
            Arc::clone(&storage),
            PredictionService::new(Arc::new(artifacts)),
        );
        (service, storage)
    }

    fn linear_only() -> PredictionArtifacts {
        PredictionArtifacts {
            scaler: Some(ScalerArtifact {
                mean: 3.0,
                scale: 1.0,
            }),
            linear: Some(LinearArtifact {
                coefficient: -1.0,
                intercept: 3.0,
            }),
            ..PredictionArtifacts::none()
        }
    }

    #[test]
    fn test_submit_persists_and_predicts() {
        let (service, storage) = service_with(linear_only());
        let respondent = service
            .ensure_respondent("maria", None, None, None)
            .expect("respondent");

        let answers = RawAnswerSet::from_values(&[4; 15])
            .expect("values")
            .with_problems("deadlines");
        let outcome = service.submit(&respondent.id, answers).expect("submits");

        // All-4 answers: inverted stress items contribute 2, the direct one 4.
        let expected_stress = (2.0 + 4.0) / 2.0 * (1.0 / 8.0) + 2.0 * (7.0 / 8.0);
        assert!((outcome.record.scores.stress.composite - expected_stress).abs() < 1e-9);
        // stress 2.125 -> normalized -0.875 -> linear 3.875, rounded 3.88
        assert_eq!(outcome.predictions.linear, Some(3.88));
        assert!(outcome.predictions.label.is_none());

        let (latest, predictions) = service
            .latest_with_predictions(&respondent.id)
            .expect("query")
            .expect("record exists");
        assert_eq!(latest.id, outcome.record.id);
        assert_eq!(predictions.linear, Some(3.88));
        assert_eq!(storage.count_records().expect("count"), 1);
    }

    #[test]
    fn test_schema_mismatch_rejects_single_submission() {
        let (service, storage) = service_with(PredictionArtifacts::none());
        let respondent = service
            .ensure_respondent("maria", None, None, None)
            .expect("respondent");

        let too_many = RawAnswerSet::from_values(&[3; 16]).expect("values");
        let err = service
            .submit(&respondent.id, too_many)
            .expect_err("rejected");
        assert!(matches!(
            err,
            WorkpulseError::Scoring(ScoringError::SchemaMismatch { .. })
        ));
        assert_eq!(storage.count_records().expect("count"), 0);

        // The service keeps working for well-formed submissions.
        let ok = RawAnswerSet::from_values(&[3; 15]).expect("values");
        service.submit(&respondent.id, ok).expect("submits");
        assert_eq!(storage.count_records().expect("count"), 1);
    }

    #[test]
    fn test_ensure_respondent_is_idempotent() {
        let (service, storage) = service_with(PredictionArtifacts::none());
        let first = service
            .ensure_respondent("maria", Some("Female".into()), None, None)
            .expect("respondent");
        let second = service
            .ensure_respondent("maria", None, None, None)
            .expect("respondent");
        assert_eq!(first.id, second.id);
        assert_eq!(storage.count_respondents().expect("count"), 1);
    }

    #[test]
    fn test_latest_without_records() {
        let (service, _storage) = service_with(PredictionArtifacts::none());
        let respondent = service
            .ensure_respondent("maria", None, None, None)
            .expect("respondent");
        assert!(service
            .latest_with_predictions(&respondent.id)
            .expect("query")
            .is_none());
    }
}
