//! Prediction artifacts: fitted scaler and model exports.
//!
//! The training pipeline exports its fitted estimators as JSON (plus a
//! plain-text decision threshold). Artifacts are loaded once at process
//! start; a file that is absent or unreadable degrades that one output for
//! the lifetime of the process. There is no hot reload.
//!
//! Tree-based regressors are exported as node arenas over the single scalar
//! input. Child indices always point forward in the arena, which load-time
//! validation enforces, so evaluation is a plain bounded walk.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Training-time decision threshold used when no artifact is present.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 3.5;

const SCALER_FILE: &str = "scaler.json";
const LINEAR_FILE: &str = "model_lr.json";
const FOREST_FILE: &str = "model_rf.json";
const BOOSTED_FILE: &str = "model_gb.json";
const CLASSIFIER_FILE: &str = "model_log.json";
const THRESHOLD_FILE: &str = "threshold.txt";

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid artifact format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid artifact: {0}")]
    Invalid(String),
}

/// Fitted standard scaler for the single stress-composite feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: f64,
    pub scale: f64,
}

impl ScalerArtifact {
    /// Normalize a raw stress composite.
    #[must_use]
    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Fitted linear regression over the normalized input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub coefficient: f64,
    pub intercept: f64,
}

impl LinearArtifact {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.coefficient * x + self.intercept
    }
}

/// One node of a fitted decision tree over the scalar input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split { threshold: f64, left: usize, right: usize },
    Leaf { value: f64 },
}

/// A fitted regression tree; nodes form an arena rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Evaluate the tree at `x`. `x <= threshold` descends left.
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        let mut idx = 0;
        while let Some(node) = self.nodes.get(idx) {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x <= *threshold { *left } else { *right };
                }
            }
        }
        // Unreachable for validated artifacts; load() rejects bad indices.
        0.0
    }

    /// Check that every split points strictly forward and in bounds, which
    /// also rules out cycles.
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::Invalid("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                for &child in [left, right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(ArtifactError::Invalid(format!(
                            "node {i} points to invalid child {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Random-forest regressor: mean of its trees' outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    pub trees: Vec<DecisionTree>,
}

impl ForestArtifact {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(x)).sum::<f64>() / self.trees.len() as f64
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("forest has no trees".into()));
        }
        self.trees.iter().try_for_each(DecisionTree::validate)
    }
}

/// Gradient-boosted regressor: initial prediction plus scaled tree outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedArtifact {
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<DecisionTree>,
}

impl BoostedArtifact {
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.init + self.learning_rate * self.trees.iter().map(|t| t.predict(x)).sum::<f64>()
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        self.trees.iter().try_for_each(DecisionTree::validate)
    }
}

/// Logistic classifier over the normalized input. The binary decision rule
/// is baked in: positive class iff the linear score is non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub coefficient: f64,
    pub intercept: f64,
}

impl LogisticArtifact {
    #[must_use]
    pub fn predict_class(&self, x: f64) -> u8 {
        u8::from(self.coefficient * x + self.intercept >= 0.0)
    }
}

/// Process-wide, read-only prediction artifacts.
///
/// Loaded once at startup and thereafter immutable, so unsynchronized
/// concurrent reads are safe. Absent artifacts stay absent for the process
/// lifetime. The decision threshold was used at training time to derive the
/// classifier's binary target; it is carried for reporting only and never
/// re-applied at inference.
#[derive(Debug, Clone, Default)]
pub struct PredictionArtifacts {
    pub scaler: Option<ScalerArtifact>,
    pub linear: Option<LinearArtifact>,
    pub forest: Option<ForestArtifact>,
    pub boosted: Option<BoostedArtifact>,
    pub classifier: Option<LogisticArtifact>,
    pub threshold: Option<f64>,
}

impl PredictionArtifacts {
    /// No artifacts at all; every prediction is omitted.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Load all artifacts found under `dir`. Absent or unreadable files are
    /// logged once and leave the corresponding output omitted.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let forest = load_json::<ForestArtifact>(&dir.join(FOREST_FILE), "random forest")
            .and_then(|f| check(f, ForestArtifact::validate, "random forest"));
        let boosted = load_json::<BoostedArtifact>(&dir.join(BOOSTED_FILE), "gradient boosting")
            .and_then(|b| check(b, BoostedArtifact::validate, "gradient boosting"));

        Self {
            scaler: load_json(&dir.join(SCALER_FILE), "scaler"),
            linear: load_json(&dir.join(LINEAR_FILE), "linear regression"),
            forest,
            boosted,
            classifier: load_json(&dir.join(CLASSIFIER_FILE), "logistic classifier"),
            threshold: load_threshold(&dir.join(THRESHOLD_FILE)),
        }
    }

    /// The training-time decision threshold, falling back to the default.
    #[must_use]
    pub fn decision_threshold(&self) -> f64 {
        self.threshold.unwrap_or(DEFAULT_DECISION_THRESHOLD)
    }
}

fn check<T>(
    artifact: T,
    validate: impl Fn(&T) -> Result<(), ArtifactError>,
    what: &str,
) -> Option<T> {
    match validate(&artifact) {
        Ok(()) => Some(artifact),
        Err(e) => {
            tracing::warn!("{what} artifact rejected: {e}; its output will be omitted");
            None
        }
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Option<T> {
    if !path.exists() {
        tracing::warn!(
            "{what} artifact not found at {}; its output will be omitted",
            path.display()
        );
        return None;
    }

    let parsed = fs::read_to_string(path)
        .map_err(ArtifactError::from)
        .and_then(|content| serde_json::from_str(&content).map_err(ArtifactError::from));

    match parsed {
        Ok(artifact) => {
            tracing::info!("Loaded {what} artifact from {}", path.display());
            Some(artifact)
        }
        Err(e) => {
            tracing::warn!("Failed to load {what} artifact: {e}; its output will be omitted");
            None
        }
    }
}

fn load_threshold(path: &Path) -> Option<f64> {
    if !path.exists() {
        tracing::warn!(
            "decision threshold not found at {}; using default {DEFAULT_DECISION_THRESHOLD}",
            path.display()
        );
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match content.trim().parse::<f64>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Invalid decision threshold: {e}; using default");
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read decision threshold: {e}; using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f64, low: f64, high: f64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_scaler_transform() {
        let scaler = ScalerArtifact {
            mean: 3.0,
            scale: 0.5,
        };
        assert!((scaler.transform(4.0) - 2.0).abs() < f64::EPSILON);
        assert!((scaler.transform(3.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_linear_predict() {
        let lr = LinearArtifact {
            coefficient: -1.2,
            intercept: 3.0,
        };
        assert!((lr.predict(1.0) - 1.8).abs() < 1e-12);
    }

    #[test]
    fn test_tree_walk() {
        let tree = stump(0.0, 1.5, 4.5);
        assert!((tree.predict(-1.0) - 1.5).abs() < f64::EPSILON);
        assert!((tree.predict(0.0) - 1.5).abs() < f64::EPSILON);
        assert!((tree.predict(0.1) - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_forest_is_mean_of_trees() {
        let forest = ForestArtifact {
            trees: vec![stump(0.0, 1.0, 3.0), stump(0.0, 2.0, 5.0)],
        };
        assert!((forest.predict(-1.0) - 1.5).abs() < f64::EPSILON);
        assert!((forest.predict(1.0) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_boosted_accumulates() {
        let boosted = BoostedArtifact {
            init: 3.0,
            learning_rate: 0.1,
            trees: vec![stump(0.0, -1.0, 1.0), stump(0.0, -2.0, 2.0)],
        };
        assert!((boosted.predict(-1.0) - 2.7).abs() < 1e-12);
        assert!((boosted.predict(1.0) - 3.3).abs() < 1e-12);
    }

    #[test]
    fn test_logistic_decision_rule() {
        let log = LogisticArtifact {
            coefficient: -2.0,
            intercept: 0.5,
        };
        assert_eq!(log.predict_class(0.0), 1);
        assert_eq!(log.predict_class(1.0), 0);
    }

    #[test]
    fn test_validation_rejects_backward_children() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { value: 1.0 },
            ],
        };
        assert!(tree.validate().is_err());

        let forest = ForestArtifact { trees: vec![tree] };
        assert!(forest.validate().is_err());
    }

    #[test]
    fn test_load_missing_dir_degrades_everything() {
        let artifacts = PredictionArtifacts::load(Path::new("/nonexistent/models"));
        assert!(artifacts.scaler.is_none());
        assert!(artifacts.linear.is_none());
        assert!(artifacts.forest.is_none());
        assert!(artifacts.boosted.is_none());
        assert!(artifacts.classifier.is_none());
        assert!(artifacts.threshold.is_none());
        assert!((artifacts.decision_threshold() - DEFAULT_DECISION_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_partial_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("scaler.json"),
            r#"{"mean":3.2,"scale":0.8}"#,
        )
        .expect("write scaler");
        std::fs::write(
            dir.path().join("model_lr.json"),
            r#"{"coefficient":-1.1,"intercept":3.4}"#,
        )
        .expect("write lr");
        std::fs::write(dir.path().join("threshold.txt"), "3.4\n").expect("write threshold");

        let artifacts = PredictionArtifacts::load(dir.path());
        assert!(artifacts.scaler.is_some());
        assert!(artifacts.linear.is_some());
        assert!(artifacts.forest.is_none());
        assert!(artifacts.classifier.is_none());
        assert!((artifacts.decision_threshold() - 3.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tree_artifact_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let forest = ForestArtifact {
            trees: vec![stump(0.3, 2.0, 4.0)],
        };
        std::fs::write(
            dir.path().join("model_rf.json"),
            serde_json::to_string(&forest).expect("serialize"),
        )
        .expect("write rf");

        let artifacts = PredictionArtifacts::load(dir.path());
        let loaded = artifacts.forest.expect("forest loads");
        assert!((loaded.predict(0.0) - 2.0).abs() < f64::EPSILON);
        assert!((loaded.predict(1.0) - 4.0).abs() < f64::EPSILON);
    }
}
