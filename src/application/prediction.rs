//! Prediction service: productivity projection from the stress composite.
//!
//! The service normalizes the stress composite through the fitted scaler and
//! queries each available model independently. Unavailable artifacts degrade
//! their own output field; they never fail the prediction as a whole.

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::artifacts::PredictionArtifacts;

/// Binary productivity label produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProductivityLabel {
    High,
    Low,
}

impl ProductivityLabel {
    /// Map the classifier's 0/1 output onto a label.
    #[must_use]
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for ProductivityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High Productivity"),
            Self::Low => write!(f, "Low Productivity"),
        }
    }
}

/// Point predictions for one stress composite. An absent field means the
/// corresponding artifact was unavailable at load time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionSet {
    /// Linear regression estimate, rounded for presentation.
    pub linear: Option<f64>,
    /// Random-forest estimate, rounded for presentation.
    pub forest: Option<f64>,
    /// Gradient-boosting estimate, rounded for presentation.
    pub boosted: Option<f64>,
    /// Classifier label.
    pub label: Option<ProductivityLabel>,
}

impl PredictionSet {
    /// True when no model produced an output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.linear.is_none() && self.forest.is_none() && self.boosted.is_none() && self.label.is_none()
    }
}

/// Service producing productivity projections from a stress composite.
pub struct PredictionService {
    artifacts: Arc<PredictionArtifacts>,
}

impl PredictionService {
    /// Create a service over an already-loaded artifact set.
    #[must_use]
    pub fn new(artifacts: Arc<PredictionArtifacts>) -> Self {
        Self { artifacts }
    }

    /// Predict productivity for a stress composite score.
    ///
    /// The composite is normalized through the fitted scaler, then fed
    /// independently into each regressor and the classifier. Without a
    /// scaler there is no normalized feature, so every output is omitted.
    #[must_use]
    pub fn predict(&self, stress_composite: f64) -> PredictionSet {
        let Some(scaler) = &self.artifacts.scaler else {
            return PredictionSet::default();
        };
        let x = scaler.transform(stress_composite);

        PredictionSet {
            linear: self.artifacts.linear.as_ref().map(|m| super::round2(m.predict(x))),
            forest: self.artifacts.forest.as_ref().map(|m| super::round2(m.predict(x))),
            boosted: self.artifacts.boosted.as_ref().map(|m| super::round2(m.predict(x))),
            label: self
                .artifacts
                .classifier
                .as_ref()
                .map(|m| ProductivityLabel::from_class(m.predict_class(x))),
        }
    }

    /// Training-time decision threshold, for reporting only. It is never
    /// re-applied at inference; the classifier's decision rule is baked in.
    #[must_use]
    pub fn decision_threshold(&self) -> f64 {
        self.artifacts.decision_threshold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifacts::{
        BoostedArtifact, DecisionTree, ForestArtifact, LinearArtifact, LogisticArtifact,
        ScalerArtifact, TreeNode,
    };

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

    fn full_artifacts() -> PredictionArtifacts {
        PredictionArtifacts {
            scaler: Some(ScalerArtifact {
                mean: 3.0,
                scale: 1.0,
            }),
            linear: Some(LinearArtifact {
                coefficient: -1.0,
                intercept: 3.0,
            }),
            forest: Some(ForestArtifact {
                trees: vec![stump(0.0, 4.0, 2.0)],
            }),
            boosted: Some(BoostedArtifact {
                init: 3.0,
                learning_rate: 0.5,
                trees: vec![stump(0.0, 1.0, -1.0)],
            }),
            classifier: Some(LogisticArtifact {
                coefficient: -2.0,
                intercept: 0.0,
            }),
            threshold: Some(3.4),
        }
    }

    #[test]
    fn test_full_prediction() {
        let service = PredictionService::new(Arc::new(full_artifacts()));

        // stress 4.0 normalizes to 1.0
        let set = service.predict(4.0);
        assert_eq!(set.linear, Some(2.0));
        assert_eq!(set.forest, Some(2.0));
        assert_eq!(set.boosted, Some(2.5));
        assert_eq!(set.label, Some(ProductivityLabel::Low));

        // stress 2.0 normalizes to -1.0
        let set = service.predict(2.0);
        assert_eq!(set.linear, Some(4.0));
        assert_eq!(set.forest, Some(4.0));
        assert_eq!(set.boosted, Some(3.5));
        assert_eq!(set.label, Some(ProductivityLabel::High));
    }

    #[test]
    fn test_outputs_round_to_two_decimals() {
        let mut artifacts = full_artifacts();
        artifacts.linear = Some(LinearArtifact {
            coefficient: -1.0,
            intercept: 3.14159,
        });
        let service = PredictionService::new(Arc::new(artifacts));
        assert_eq!(service.predict(3.0).linear, Some(3.14));
    }

    #[test]
    fn test_missing_classifier_degrades_only_its_field() {
        let mut artifacts = full_artifacts();
        artifacts.classifier = None;
        let service = PredictionService::new(Arc::new(artifacts));

        let set = service.predict(4.0);
        assert!(set.label.is_none());
        assert_eq!(set.linear, Some(2.0));
        assert_eq!(set.forest, Some(2.0));
        assert_eq!(set.boosted, Some(2.5));
    }

    #[test]
    fn test_missing_scaler_omits_everything() {
        let mut artifacts = full_artifacts();
        artifacts.scaler = None;
        let service = PredictionService::new(Arc::new(artifacts));

        assert!(service.predict(4.0).is_empty());
    }

    #[test]
    fn test_threshold_is_reporting_only() {
        let service = PredictionService::new(Arc::new(full_artifacts()));
        assert!((service.decision_threshold() - 3.4).abs() < f64::EPSILON);

        // Predictions are identical on either side of the threshold value;
        // the classifier's own rule decides the label.
        let below = service.predict(3.3);
        let above = service.predict(3.5);
        assert_eq!(below.label, Some(ProductivityLabel::Low));
        assert_eq!(above.label, Some(ProductivityLabel::Low));
    }

    #[test]
    fn test_label_display() {
        assert_eq!(ProductivityLabel::High.to_string(), "High Productivity");
        assert_eq!(ProductivityLabel::Low.to_string(), "Low Productivity");
    }
}
