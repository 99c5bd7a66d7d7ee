//! R-R feature classifier: FA vs Normal
//!
//! Three candidate model families are trained on standardized features with
//! balanced class weights, and the one with the best test ROC-AUC is kept.
//!
//! Architecture: FeatureVector → StandardScaler → TrainedClassifier → P(FA)

pub mod artifacts;
pub mod gbdt_model;
pub mod logistic;
pub mod metrics;
pub mod model;
pub mod scaler;
pub mod split;
pub mod train;
pub mod weights;

pub use artifacts::{ArtifactPaths, ModelBundle};
pub use gbdt_model::{GbdtClassifier, GbdtConfig};
pub use logistic::{LogisticConfig, LogisticRegression};
pub use metrics::{ClassificationMetrics, ConfusionMatrix};
pub use model::{ClassProbabilities, MlpClassifier, MlpConfig};
pub use scaler::StandardScaler;
pub use split::{stratified_split, Split};
pub use train::{train, CandidateResult, TrainConfig, TrainOutcome, TrainingReport};
pub use weights::ClassWeights;

use serde::{Deserialize, Serialize};

use crate::features::NUM_FEATURES;

/// Candidate model families, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    GradientBoosting,
    LogisticRegression,
    NeuralNetwork,
}

impl ModelKind {
    pub fn all() -> Vec<ModelKind> {
        vec![
            ModelKind::GradientBoosting,
            ModelKind::LogisticRegression,
            ModelKind::NeuralNetwork,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::GradientBoosting => "Gradient Boosting",
            ModelKind::LogisticRegression => "Logistic Regression",
            ModelKind::NeuralNetwork => "Neural Network",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A fitted model of any candidate family. Input rows must already be
/// standardized with the scaler it was trained alongside.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedClassifier {
    GradientBoosting(GbdtClassifier),
    LogisticRegression(LogisticRegression),
    NeuralNetwork(MlpClassifier),
}

impl TrainedClassifier {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedClassifier::GradientBoosting(_) => ModelKind::GradientBoosting,
            TrainedClassifier::LogisticRegression(_) => ModelKind::LogisticRegression,
            TrainedClassifier::NeuralNetwork(_) => ModelKind::NeuralNetwork,
        }
    }

    pub fn predict(&self, row: &[f64; NUM_FEATURES]) -> ClassProbabilities {
        match self {
            TrainedClassifier::GradientBoosting(m) => m.predict(row),
            TrainedClassifier::LogisticRegression(m) => {
                ClassProbabilities::from_fa(m.predict_fa(row))
            }
            TrainedClassifier::NeuralNetwork(m) => m.predict(row),
        }
    }

    /// Check that loaded parameters fit the feature vector. Boosted trees
    /// carry no fixed shape.
    pub fn check_shape(&self) -> Result<(), String> {
        match self {
            TrainedClassifier::GradientBoosting(_) => Ok(()),
            TrainedClassifier::LogisticRegression(m) => m.check_shape(),
            TrainedClassifier::NeuralNetwork(m) => m.check_shape(),
        }
    }

    pub fn predict_batch(&self, rows: &[[f64; NUM_FEATURES]]) -> Vec<ClassProbabilities> {
        match self {
            TrainedClassifier::GradientBoosting(m) => m.predict_batch(rows),
            _ => rows.iter().map(|r| self.predict(r)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_serde_names() {
        let json = serde_json::to_string(&ModelKind::all()).unwrap();
        assert_eq!(
            json,
            r#"["gradient_boosting","logistic_regression","neural_network"]"#
        );
        assert_eq!(ModelKind::NeuralNetwork.to_string(), "Neural Network");
    }

    #[test]
    fn test_trained_classifier_is_tagged() {
        let model = TrainedClassifier::LogisticRegression(LogisticRegression {
            weights: vec![0.0; NUM_FEATURES],
            bias: 0.0,
        });
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["kind"], "logistic_regression");

        let back: TrainedClassifier = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), ModelKind::LogisticRegression);
        let p = back.predict(&[0.0; NUM_FEATURES]);
        assert!((p.fa - 0.5).abs() < 1e-12);
    }
}
