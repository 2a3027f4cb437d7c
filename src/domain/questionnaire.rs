//! Questionnaire schema: constructs, items, and per-item polarity.
//!
//! The schema is a static lookup table fixed at process start. Item traversal
//! order defines the canonical answer ordering: ordinal `i` always maps to the
//! `i`-th item across constructs (stress domain first, then productivity).

use serde::{Deserialize, Serialize};

/// Whether a higher raw answer indicates more or less of the underlying construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Higher answer means more of the construct; contributes the raw value.
    Direct,
    /// Item is stated positively (higher answer means less of the construct);
    /// contributes the value reflected about the scale midpoint.
    Inverted,
}

impl Polarity {
    /// Contribution of a raw answer `value` in [1,5] under this polarity.
    ///
    /// `Inverted` reflects the 1-5 scale about its midpoint: `6 - value`.
    #[must_use]
    pub fn contribution(self, value: u8) -> f64 {
        self.apply(f64::from(value))
    }

    /// Same reflection for already-numeric source fields (bulk import).
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Direct => value,
            Self::Inverted => 6.0 - value,
        }
    }
}

/// The two scoring domains a construct can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreDomain {
    Stress,
    Productivity,
}

impl std::fmt::Display for ScoreDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stress => write!(f, "Job Stress"),
            Self::Productivity => write!(f, "Productivity"),
        }
    }
}

/// A single Likert-scale item (answered 1-5).
#[derive(Debug, Clone)]
pub struct Item {
    /// Statement shown to the respondent.
    pub prompt: &'static str,
    pub polarity: Polarity,
}

/// A named latent dimension measured by one or more items.
#[derive(Debug, Clone)]
pub struct Construct {
    /// Display name, e.g. "Role Ambiguity".
    pub name: &'static str,
    /// Stable identifier used for storage columns and import mappings.
    pub key: &'static str,
    pub domain: ScoreDomain,
    pub items: Vec<Item>,
}

/// Ordered, immutable set of constructs with their items and polarities.
#[derive(Debug, Clone)]
pub struct QuestionnaireSchema {
    constructs: Vec<Construct>,
}

impl QuestionnaireSchema {
    /// The standard workplace questionnaire: 8 stress constructs (10 items)
    /// followed by 4 productivity constructs (5 items).
    ///
    /// The extra-work item is the only stress item stated as the construct
    /// itself; every other stress item is a positive statement and therefore
    /// inverted. All productivity items are direct.
    #[must_use]
    pub fn standard() -> Self {
        use Polarity::{Direct, Inverted};
        use ScoreDomain::{Productivity, Stress};

        let item = |prompt, polarity| Item { prompt, polarity };

        let constructs = vec![
            Construct {
                name: "Workload",
                key: "workload",
                domain: Stress,
                items: vec![
                    item("I am able to reach the target within the specified time.", Inverted),
                    item("I am suddenly burdened with more work without sufficient time.", Direct),
                ],
            },
            Construct {
                name: "Role Ambiguity",
                key: "role_ambiguity",
                domain: Stress,
                items: vec![item(
                    "Sufficient and clear information is provided to perform my tasks.",
                    Inverted,
                )],
            },
            Construct {
                name: "Job Security",
                key: "job_security",
                domain: Stress,
                items: vec![item("I feel secure in my job.", Inverted)],
            },
            Construct {
                name: "Gender Discrimination",
                key: "gender_discrim",
                domain: Stress,
                items: vec![item("Equal career growth opportunities are provided.", Inverted)],
            },
            Construct {
                name: "Interpersonal Relationships",
                key: "interpersonal",
                domain: Stress,
                items: vec![item("Relationships at all levels are good.", Inverted)],
            },
            Construct {
                name: "Resource Constraints",
                key: "resources",
                domain: Stress,
                items: vec![item("Enough time is provided to complete tasks.", Inverted)],
            },
            Construct {
                name: "Job Satisfaction",
                key: "satisfaction",
                domain: Stress,
                items: vec![item("I am satisfied with working conditions.", Inverted)],
            },
            Construct {
                name: "Organizational Support",
                key: "support",
                domain: Stress,
                items: vec![
                    item("Training is provided regularly.", Inverted),
                    item("Career development is encouraged.", Inverted),
                ],
            },
            Construct {
                name: "Timings",
                key: "timings",
                domain: Productivity,
                items: vec![item("I utilize time efficiently.", Direct)],
            },
            Construct {
                name: "Supervisor Competence",
                key: "supervisor",
                domain: Productivity,
                items: vec![
                    item("Supervisor motivates employees.", Direct),
                    item("Supervisor communicates clearly.", Direct),
                ],
            },
            Construct {
                name: "Compensation",
                key: "compensation",
                domain: Productivity,
                items: vec![item("I am satisfied with salary.", Direct)],
            },
            Construct {
                name: "Systems & Procedures",
                key: "systems",
                domain: Productivity,
                items: vec![item("Procedures ensure quality work.", Direct)],
            },
        ];

        Self { constructs }
    }

    /// All constructs in traversal order.
    #[must_use]
    pub fn constructs(&self) -> &[Construct] {
        &self.constructs
    }

    /// Constructs belonging to one domain, in traversal order.
    pub fn constructs_in(&self, domain: ScoreDomain) -> impl Iterator<Item = &Construct> {
        self.constructs.iter().filter(move |c| c.domain == domain)
    }

    /// Look up a construct by its stable key.
    #[must_use]
    pub fn construct(&self, key: &str) -> Option<&Construct> {
        self.constructs.iter().find(|c| c.key == key)
    }

    /// Total number of scored items across all constructs.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.constructs.iter().map(|c| c.items.len()).sum()
    }
}

/// Supplemental, position-specific questions appended to the questionnaire.
///
/// These are captured in the raw answer payload but never scored. Unknown
/// positions get no supplement.
#[must_use]
pub fn role_supplements(position: &str) -> &'static [&'static str] {
    match position {
        "Manager" => &[
            "I clearly delegate tasks to my team.",
            "I receive adequate support from senior management.",
            "I have the autonomy to make decisions for my team.",
        ],
        "Senior" => &[
            "I mentor junior colleagues regularly.",
            "My role involves handling complex tasks independently.",
        ],
        "Junior" => &[
            "I receive clear guidance on my tasks.",
            "I have opportunities to learn on the job.",
        ],
        "Intern" => &[
            "I get sufficient onboarding and training.",
            "My tasks are appropriate for my experience level.",
        ],
        "Staff" => &[
            "I have clarity on my daily responsibilities.",
            "I receive timely feedback on my work.",
        ],
        _ => &[],
    }
}
