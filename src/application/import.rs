//! Bulk import: normalizes external dataset rows onto the construct set.
//!
//! External datasets ship the same constructs under different column layouts.
//! Rather than one importer per layout, a single reducer runs over a
//! parameterized mapping table (construct -> source columns -> polarity);
//! each known layout is just a different table.
//!
//! Import is sequential; the existence check before insert is the only
//! cross-row state. Re-running an import converges through that idempotency
//! check, and the UNIQUE username constraint backstops it.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::domain::{
    ConstructScore, DomainScores, Polarity, QuestionnaireSchema, RawAnswerSet, Respondent,
    ScoreDomain, ScoredRecord, SurveyScores,
};
use crate::domain::scoring::{PRODUCTIVITY_FLOOR, STRESS_CEILING};
use crate::ports::Storage;
use crate::{Result, WorkpulseError};

/// Username prefix for rows imported from external datasets. Row numbers
/// make the identity stable across re-runs.
const IMPORT_USERNAME_PREFIX: &str = "csv_user_";

/// Errors raised while normalizing a single external row.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NormalizeError {
    #[error("required field '{0}' is missing")]
    MissingField(String),

    #[error("field '{0}' is not numeric: '{1}'")]
    NonNumeric(String, String),

    /// The mapping covers no sources for a schema construct. This is a
    /// configuration defect and fails the batch, unlike row-level errors.
    #[error("mapping has no sources for construct '{0}'")]
    MappingGap(String),
}

/// A named source column with polarity semantics.
#[derive(Debug, Clone, Copy)]
pub struct FieldSource {
    pub column: &'static str,
    pub polarity: Polarity,
}

/// Mapping of one external schema variant onto the construct set.
#[derive(Debug, Clone)]
pub struct ImportMapping {
    name: &'static str,
    sources: HashMap<&'static str, Vec<FieldSource>>,
}

impl ImportMapping {
    /// Layout with one pre-aggregated column per construct, already on the
    /// construct scale; every field is used directly.
    #[must_use]
    pub fn aggregated() -> Self {
        let direct = |column| FieldSource {
            column,
            polarity: Polarity::Direct,
        };
        let sources = HashMap::from([
            ("workload", vec![direct("Workload")]),
            ("role_ambiguity", vec![direct("Role_Ambiguity")]),
            ("job_security", vec![direct("Job_Security")]),
            ("gender_discrim", vec![direct("Gender_Discrimination")]),
            ("interpersonal", vec![direct("Interpersonal_Relationships")]),
            ("resources", vec![direct("Resource_Constraints")]),
            ("satisfaction", vec![direct("Job_Satisfaction")]),
            ("support", vec![direct("Organizational_Support")]),
            ("timings", vec![direct("Timings")]),
            ("supervisor", vec![direct("Supervisor_Competence")]),
            ("compensation", vec![direct("Compensation")]),
            ("systems", vec![direct("Systems_Procedures")]),
        ]);
        Self {
            name: "aggregated",
            sources,
        }
    }

    /// Layout with item-level columns. Stress items are stated positively and
    /// get subtracted from 6, except the extra-work item which already states
    /// the construct; productivity items are used directly. Workload,
    /// Organizational Support and Supervisor Competence average two columns.
    #[must_use]
    pub fn item_level() -> Self {
        let field = |column, polarity| FieldSource { column, polarity };
        let inverted = |column| field(column, Polarity::Inverted);
        let direct = |column| field(column, Polarity::Direct);
        let sources = HashMap::from([
            (
                "workload",
                vec![inverted("Workload_TargetTime"), direct("Workload_ExtraWork")],
            ),
            ("role_ambiguity", vec![inverted("RoleAmbiguity_ClearInfo")]),
            ("job_security", vec![inverted("JobSecurity_Secure")]),
            (
                "gender_discrim",
                vec![inverted("GenderDiscrimination_EqualGrowth")],
            ),
            ("interpersonal", vec![inverted("Interpersonal_GoodRelations")]),
            ("resources", vec![inverted("Resources_EnoughTime")]),
            ("satisfaction", vec![inverted("JobSatisfaction_WorkConditions")]),
            (
                "support",
                vec![
                    inverted("OrgSupport_Training"),
                    inverted("OrgSupport_CareerGrowth"),
                ],
            ),
            ("timings", vec![direct("Productivity_TimeUtilization")]),
            (
                "supervisor",
                vec![
                    direct("Supervisor_Motivation"),
                    direct("Supervisor_Communication"),
                ],
            ),
            ("compensation", vec![direct("Compensation_Salary")]),
            ("systems", vec![direct("Systems_QualityProcedures")]),
        ]);
        Self {
            name: "item-level",
            sources,
        }
    }

    /// Source columns for one construct key.
    #[must_use]
    pub fn sources_for(&self, key: &str) -> Option<&[FieldSource]> {
        self.sources.get(key).map(Vec::as_slice)
    }
}

/// Aggregate outcome of one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows inserted as respondent + record.
    pub inserted: usize,
    /// Rows whose identity already existed (skipped silently).
    pub skipped_existing: usize,
    /// Rows skipped entirely for missing or non-numeric required fields.
    pub skipped_malformed: usize,
}

/// Imports external dataset rows as scored records.
pub struct DatasetImporter<S: Storage> {
    schema: QuestionnaireSchema,
    mapping: ImportMapping,
    storage: Arc<S>,
}

impl<S> DatasetImporter<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    #[must_use]
    pub fn new(schema: QuestionnaireSchema, mapping: ImportMapping, storage: Arc<S>) -> Self {
        Self {
            schema,
            mapping,
            storage,
        }
    }

    /// Normalize one row's named fields into construct and composite scores.
    ///
    /// Each construct is the mean of its polarity-adjusted source fields; the
    /// composites and the stress-ceiling clamp are applied exactly as in
    /// live scoring.
    ///
    /// # Errors
    /// `MissingField`/`NonNumeric` for row-level defects, `MappingGap` when
    /// the mapping does not cover a schema construct.
    pub fn normalize_row(
        &self,
        fields: &HashMap<String, String>,
    ) -> std::result::Result<SurveyScores, NormalizeError> {
        let stress = self.domain_scores(ScoreDomain::Stress, fields)?;
        let productivity = self.domain_scores(ScoreDomain::Productivity, fields)?;

        let stress_composite = composite(&stress);
        let mut productivity_composite = composite(&productivity);
        if stress_composite >= STRESS_CEILING {
            productivity_composite = PRODUCTIVITY_FLOOR;
        }

        Ok(SurveyScores {
            stress: DomainScores {
                constructs: stress,
                composite: stress_composite,
            },
            productivity: DomainScores {
                constructs: productivity,
                composite: productivity_composite,
            },
        })
    }

    fn domain_scores(
        &self,
        domain: ScoreDomain,
        fields: &HashMap<String, String>,
    ) -> std::result::Result<Vec<ConstructScore>, NormalizeError> {
        let mut scores = Vec::new();
        for construct in self.schema.constructs_in(domain) {
            let sources = self
                .mapping
                .sources_for(construct.key)
                .ok_or_else(|| NormalizeError::MappingGap(construct.key.to_string()))?;

            let mut sum = 0.0;
            for source in sources {
                let raw = fields
                    .get(source.column)
                    .map(String::as_str)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| NormalizeError::MissingField(source.column.to_string()))?;
                let value: f64 = raw.parse().map_err(|_| {
                    NormalizeError::NonNumeric(source.column.to_string(), raw.to_string())
                })?;
                sum += source.polarity.apply(value);
            }

            scores.push(ConstructScore::new(
                construct.key,
                construct.name,
                sum / sources.len() as f64,
            ));
        }
        Ok(scores)
    }

    /// Import every row of a CSV dataset.
    ///
    /// Row `i` (1-based) maps to the identity `csv_user_<i>`. Existing
    /// identities are skipped silently; malformed rows are skipped entirely,
    /// including their identity, and only counted. Neither stops the batch.
    ///
    /// # Errors
    /// Returns error on unreadable input, storage failure, or a mapping gap.
    pub fn import_csv<R: Read>(&self, input: R) -> Result<ImportSummary> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader.headers()?.clone();

        let mut summary = ImportSummary::default();

        for (i, row) in reader.records().enumerate() {
            let row_number = i + 1;
            let username = format!("{IMPORT_USERNAME_PREFIX}{row_number}");

            if self
                .storage
                .find_respondent(&username)
                .map_err(|e| WorkpulseError::Storage(e.into()))?
                .is_some()
            {
                summary.skipped_existing += 1;
                continue;
            }

            // A row the CSV reader itself rejects is malformed like any other.
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::debug!("Skipping unreadable row {row_number}: {e}");
                    summary.skipped_malformed += 1;
                    continue;
                }
            };

            let fields: HashMap<String, String> = headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect();

            let scores = match self.normalize_row(&fields) {
                Ok(scores) => scores,
                Err(gap @ NormalizeError::MappingGap(_)) => return Err(gap.into()),
                Err(e) => {
                    tracing::debug!("Skipping malformed row {row_number}: {e}");
                    summary.skipped_malformed += 1;
                    continue;
                }
            };

            let respondent = Respondent::new(&username).with_profile(
                fields.get("Gender").filter(|v| !v.is_empty()).cloned(),
                fields.get("Department").filter(|v| !v.is_empty()).cloned(),
                None,
            );
            self.storage
                .insert_respondent(&respondent)
                .map_err(|e| WorkpulseError::Storage(e.into()))?;

            let record = ScoredRecord::new(respondent.id, scores, RawAnswerSet::empty());
            self.storage
                .save_record(&record)
                .map_err(|e| WorkpulseError::Storage(e.into()))?;
            summary.inserted += 1;
        }

        tracing::info!(
            "Import ({}) complete: {} inserted, {} already present, {} malformed",
            self.mapping.name,
            summary.inserted,
            summary.skipped_existing,
            summary.skipped_malformed
        );
        Ok(summary)
    }
}

fn composite(scores: &[ConstructScore]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|c| c.score).sum::<f64>() / scores.len() as f64
}
