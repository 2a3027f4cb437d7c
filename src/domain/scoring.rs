//! Scoring engine: reduces a raw answer set to construct and composite scores.
//!
//! Scoring is a pure, synchronous computation with no shared state; answer
//! sets can be scored fully in parallel. The polarity transform lives on the
//! schema items, so this module is a single generic reducer with no
//! per-construct branching.

use super::answers::{RawAnswerSet, SCALE_MIDPOINT};
use super::questionnaire::{QuestionnaireSchema, ScoreDomain};
use super::record::{ConstructScore, DomainScores, SurveyScores};

/// Stress composite at or above which the productivity clamp applies.
pub const STRESS_CEILING: f64 = 5.0;

/// Productivity composite forced by the clamp.
pub const PRODUCTIVITY_FLOOR: f64 = 1.0;

/// Errors raised while scoring an answer set.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoringError {
    /// A scored ordinal does not exist in the questionnaire. This is a caller
    /// contract violation and rejects the single submission, never the process.
    #[error("answer ordinal q{ordinal} is outside the questionnaire's {expected} items")]
    SchemaMismatch { ordinal: usize, expected: usize },
}

/// Score an answer set against the questionnaire schema.
///
/// Per construct, each item's answer contributes its polarity-adjusted value
/// (`v` for direct items, `6 - v` for inverted ones) and the construct score
/// is the arithmetic mean of the contributions. Missing ordinals default to
/// the scale midpoint (3) rather than failing the submission.
///
/// Composites are the per-domain means of the construct scores. After both
/// composites are computed, the inverse-relationship clamp runs
/// unconditionally: a stress composite at or above 5.0 forces the
/// productivity composite to 1.0. The clamp never alters the stress
/// composite itself.
///
/// # Errors
/// Returns `SchemaMismatch` if any scored ordinal falls outside the schema.
pub fn score(
    schema: &QuestionnaireSchema,
    answers: &RawAnswerSet,
) -> Result<SurveyScores, ScoringError> {
    let expected = schema.item_count();
    if let Some(ordinal) = answers.scored_ordinals().find(|&o| o == 0 || o > expected) {
        return Err(ScoringError::SchemaMismatch { ordinal, expected });
    }

    let mut stress = Vec::new();
    let mut productivity = Vec::new();
    let mut ordinal = 1;

    for construct in schema.constructs() {
        let mut sum = 0.0;
        for item in &construct.items {
            let value = answers.get(ordinal).unwrap_or(SCALE_MIDPOINT);
            sum += item.polarity.contribution(value);
            ordinal += 1;
        }

        let entry = ConstructScore::new(construct.key, construct.name, sum / construct.items.len() as f64);
        match construct.domain {
            ScoreDomain::Stress => stress.push(entry),
            ScoreDomain::Productivity => productivity.push(entry),
        }
    }

    let stress_composite = mean(&stress);
    let mut productivity_composite = mean(&productivity);

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

fn mean(scores: &[ConstructScore]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|c| c.score).sum::<f64>() / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> QuestionnaireSchema {
        QuestionnaireSchema::standard()
    }

    fn answers(values: &[u8]) -> RawAnswerSet {
        RawAnswerSet::from_values(values).expect("test values in range")
    }

    #[test]
    fn test_all_midpoint_answers_fix_every_construct_at_three() {
        let scores = score(&schema(), &answers(&[3; 15])).expect("scores");
        for c in scores
            .stress
            .constructs
            .iter()
            .chain(scores.productivity.constructs.iter())
        {
            assert!((c.score - 3.0).abs() < f64::EPSILON, "{} != 3", c.key);
        }
        assert!((scores.stress.composite - 3.0).abs() < f64::EPSILON);
        assert!((scores.productivity.composite - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_construct_scores_stay_on_scale() {
        for values in [[1u8; 15], [5; 15], [2; 15], [4; 15]] {
            let scores = score(&schema(), &answers(&values)).expect("scores");
            for c in scores
                .stress
                .constructs
                .iter()
                .chain(scores.productivity.constructs.iter())
            {
                assert!((1.0..=5.0).contains(&c.score), "{}={}", c.key, c.score);
            }
        }
    }

    #[test]
    fn test_inversion_law() {
        // Ordinal 1 (target time) is inverted, ordinal 2 (extra work) direct.
        let scores = score(&schema(), &answers(&[5, 1, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3]))
            .expect("scores");
        // Workload = mean(6 - 5, 1) = 1.
        assert!((scores.stress.constructs[0].score - 1.0).abs() < f64::EPSILON);

        let scores = score(&schema(), &answers(&[1, 5, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3]))
            .expect("scores");
        // Workload = mean(6 - 1, 5) = 5.
        assert!((scores.stress.constructs[0].score - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_answers_default_to_midpoint() {
        let sparse = RawAnswerSet::from_values(&[5]).expect("one answer");
        let scores = score(&schema(), &sparse).expect("scores");
        // q1 answered 5 (inverted -> 1), q2 missing -> 3; Workload = 2.
        assert!((scores.stress.constructs[0].score - 2.0).abs() < f64::EPSILON);
        // Everything else is all-missing, so it sits at the midpoint.
        assert!((scores.productivity.composite - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_minimal_stress_composite() {
        // Every stress contribution is exactly 1: inverted items answered 5,
        // the direct extra-work item answered 1.
        let values = [5, 1, 5, 5, 5, 5, 5, 5, 5, 5, 3, 3, 3, 3, 3];
        let scores = score(&schema(), &answers(&values)).expect("scores");
        assert!((scores.stress.composite - 1.0).abs() < f64::EPSILON);
        // Well under the ceiling, so productivity is untouched.
        assert!((scores.productivity.composite - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_at_exact_ceiling() {
        // Every stress contribution is exactly 5, landing the composite on
        // 5.0 precisely; raw productivity items average 4.5.
        let values = [1, 5, 1, 1, 1, 1, 1, 1, 1, 1, 5, 4, 4, 4, 5];
        let scores = score(&schema(), &answers(&values)).expect("scores");
        assert!((scores.stress.composite - 5.0).abs() < f64::EPSILON);
        assert!((scores.productivity.composite - 1.0).abs() < f64::EPSILON);

        // Same productivity answers under low stress score 4.5 unclamped.
        let relaxed = [5, 1, 5, 5, 5, 5, 5, 5, 5, 5, 5, 4, 4, 4, 5];
        let scores = score(&schema(), &answers(&relaxed)).expect("scores");
        assert!((scores.productivity.composite - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_never_touches_stress() {
        let values = [1, 5, 1, 1, 1, 1, 1, 1, 1, 1, 5, 5, 5, 5, 5];
        let scores = score(&schema(), &answers(&values)).expect("scores");
        assert!((scores.stress.composite - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_out_of_schema_ordinal_is_rejected() {
        let sixteen = answers(&[3; 16]);
        let err = score(&schema(), &sixteen).expect_err("q16 does not exist");
        assert!(matches!(
            err,
            ScoringError::SchemaMismatch {
                ordinal: 16,
                expected: 15
            }
        ));
    }
}
