//! Scored survey records and stress banding.
//!
//! A `ScoredRecord` is the unit of persistence: every construct score, both
//! composites, the raw answer payload, and a creation timestamp. Records from
//! the live path and the bulk-import path share this shape.

use serde::{Deserialize, Serialize};

use super::answers::RawAnswerSet;

/// Stress band for a stress composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressBand {
    /// Composite below 2.0
    Low,
    /// Composite in [2.0, 3.0]
    Medium,
    /// Composite above 3.0
    High,
}

impl StressBand {
    /// Band for a stress composite.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 2.0 {
            Self::Low
        } else if score <= 3.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low stress - Comfortable working conditions",
            Self::Medium => "Medium stress - Worth monitoring",
            Self::High => "High stress - Intervention recommended",
        }
    }
}

impl std::fmt::Display for StressBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// One construct's polarity-adjusted mean, always in [1,5].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructScore {
    /// Stable construct identifier (matches the schema key).
    pub key: String,
    /// Display name.
    pub name: String,
    pub score: f64,
}

impl ConstructScore {
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>, score: f64) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            score,
        }
    }
}

/// Construct scores and composite for one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainScores {
    /// Constructs in schema traversal order.
    pub constructs: Vec<ConstructScore>,
    /// Arithmetic mean of the construct scores (post-clamp for productivity).
    pub composite: f64,
}

impl DomainScores {
    /// Score of one construct by key.
    #[must_use]
    pub fn construct(&self, key: &str) -> Option<f64> {
        self.constructs.iter().find(|c| c.key == key).map(|c| c.score)
    }
}

/// Result of scoring one answer set: both domains plus composites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyScores {
    pub stress: DomainScores,
    pub productivity: DomainScores,
}

impl SurveyScores {
    /// Band of the stress composite.
    #[must_use]
    pub fn stress_band(&self) -> StressBand {
        StressBand::from_score(self.stress.composite)
    }

    /// Score of one construct by key, searching both domains.
    #[must_use]
    pub fn construct(&self, key: &str) -> Option<f64> {
        self.stress
            .construct(key)
            .or_else(|| self.productivity.construct(key))
    }
}

/// Complete scored record including metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// Unique identifier
    pub id: String,

    /// Reference to the respondent this record belongs to
    pub respondent_id: String,

    /// Construct and composite scores
    pub scores: SurveyScores,

    /// Item-level answers (empty for externally imported records)
    pub raw_answers: RawAnswerSet,

    /// Timestamp of submission or import
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

impl ScoredRecord {
    /// Create a new record for a respondent.
    #[must_use]
    pub fn new(respondent_id: impl Into<String>, scores: SurveyScores, raw_answers: RawAnswerSet) -> Self {
        Self {
            id: uuid_v4(),
            respondent_id: respondent_id.into(),
            scores,
            raw_answers,
            submitted_at: chrono::Utc::now(),
        }
    }

    /// Band of the stress composite.
    #[must_use]
    pub fn stress_band(&self) -> StressBand {
        self.scores.stress_band()
    }
}

/// Generate a simple UUID v4 (random) using CSPRNG.
///
/// Uses ChaCha20Rng seeded from OS entropy to ensure identifiers cannot be
/// predicted across platforms.
pub(crate) fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stress_band_boundaries() {
        assert_eq!(StressBand::from_score(1.2), StressBand::Low);
        assert_eq!(StressBand::from_score(2.0), StressBand::Medium);
        assert_eq!(StressBand::from_score(3.0), StressBand::Medium);
        assert_eq!(StressBand::from_score(3.01), StressBand::High);
        assert_eq!(StressBand::from_score(5.0), StressBand::High);
    }

    #[test]
    fn test_construct_lookup_spans_domains() {
        let scores = SurveyScores {
            stress: DomainScores {
                constructs: vec![ConstructScore::new("workload", "Workload", 2.5)],
                composite: 2.5,
            },
            productivity: DomainScores {
                constructs: vec![ConstructScore::new("timings", "Timings", 4.0)],
                composite: 4.0,
            },
        };
        assert_eq!(scores.construct("workload"), Some(2.5));
        assert_eq!(scores.construct("timings"), Some(4.0));
        assert_eq!(scores.construct("missing"), None);
    }

    #[test]
    fn test_record_creation() {
        let scores = SurveyScores {
            stress: DomainScores {
                constructs: vec![],
                composite: 3.4,
            },
            productivity: DomainScores {
                constructs: vec![],
                composite: 3.1,
            },
        };
        let record = ScoredRecord::new("resp-1", scores, RawAnswerSet::empty());
        assert_eq!(record.respondent_id, "resp-1");
        assert_eq!(record.stress_band(), StressBand::High);
        assert!(record.raw_answers.is_empty());
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
    }
}
