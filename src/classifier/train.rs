//! Model Trainer
//!
//! Stratified split → scaler fit on train only → every candidate trained with
//! balanced class weights → best test ROC-AUC wins (ties: higher F1, then
//! candidate order).

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::gbdt_model::{GbdtClassifier, GbdtConfig};
use super::logistic::{LogisticConfig, LogisticRegression};
use super::metrics::ClassificationMetrics;
use super::model::{MlpClassifier, MlpConfig};
use super::scaler::StandardScaler;
use super::split::stratified_split;
use super::weights::ClassWeights;
use super::{ModelKind, TrainedClassifier};
use crate::dataset::Dataset;
use crate::error::{EcgError, EcgResult};
use crate::features::{FEATURE_NAMES, NUM_FEATURES};
use crate::models::Label;

/// Minimum examples of each class needed to train
pub const MIN_PER_CLASS: usize = 2;

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Fraction of each class held out for testing
    pub test_ratio: f64,
    /// Seed for the split and any stochastic candidate
    pub seed: u64,
    /// Candidates to train, in tie-break order
    pub candidates: Vec<ModelKind>,
    pub gradient_boosting: GbdtConfig,
    pub logistic_regression: LogisticConfig,
    pub neural_network: MlpConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            candidates: ModelKind::all(),
            gradient_boosting: GbdtConfig::default(),
            logistic_regression: LogisticConfig::default(),
            neural_network: MlpConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> EcgResult<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(EcgError::Training(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.candidates.is_empty() {
            return Err(EcgError::Training("no candidate models configured".into()));
        }
        Ok(())
    }

    /// Candidates with duplicates removed, first occurrence wins
    fn unique_candidates(&self) -> Vec<ModelKind> {
        let mut seen = Vec::new();
        for kind in &self.candidates {
            if !seen.contains(kind) {
                seen.push(*kind);
            }
        }
        seen
    }
}

/// Per-class row counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub normal: usize,
    pub fa: usize,
}

impl ClassCounts {
    fn of(labels: &[Label]) -> Self {
        let fa = labels.iter().filter(|l| l.is_positive()).count();
        Self {
            normal: labels.len() - fa,
            fa,
        }
    }
}

/// Metrics for one trained candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub model: ModelKind,
    pub metrics: ClassificationMetrics,
    pub train_seconds: f64,
}

/// Everything the training run measured, persisted next to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: DateTime<Utc>,
    pub selected: ModelKind,
    pub candidates: Vec<CandidateResult>,
    pub train_counts: ClassCounts,
    pub test_counts: ClassCounts,
    pub class_weights: ClassWeights,
    pub test_ratio: f64,
    pub seed: u64,
    pub feature_names: Vec<String>,
}

impl TrainingReport {
    pub fn selected_result(&self) -> Option<&CandidateResult> {
        self.candidates.iter().find(|c| c.model == self.selected)
    }
}

/// Fitted artifacts plus the report describing them
pub struct TrainOutcome {
    pub scaler: StandardScaler,
    pub model: TrainedClassifier,
    pub report: TrainingReport,
}

fn select<T: Copy>(rows: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| rows[i]).collect()
}

/// True when `candidate` should replace `best`. Earlier candidates win exact
/// ties because the comparison is strict.
fn is_better(candidate: &ClassificationMetrics, best: &ClassificationMetrics) -> bool {
    candidate.roc_auc > best.roc_auc
        || (candidate.roc_auc == best.roc_auc && candidate.f1 > best.f1)
}

fn fit_candidate(
    kind: ModelKind,
    rows: &[[f64; NUM_FEATURES]],
    labels: &[Label],
    sample_weights: &[f64],
    config: &TrainConfig,
) -> EcgResult<TrainedClassifier> {
    Ok(match kind {
        ModelKind::GradientBoosting => TrainedClassifier::GradientBoosting(GbdtClassifier::fit(
            rows,
            labels,
            sample_weights,
            &config.gradient_boosting,
        )?),
        ModelKind::LogisticRegression => {
            TrainedClassifier::LogisticRegression(LogisticRegression::fit(
                rows,
                labels,
                sample_weights,
                &config.logistic_regression,
            )?)
        }
        ModelKind::NeuralNetwork => {
            let mlp = MlpConfig {
                seed: config.seed,
                ..config.neural_network.clone()
            };
            TrainedClassifier::NeuralNetwork(MlpClassifier::fit(rows, labels, sample_weights, &mlp)?)
        }
    })
}

/// Train all configured candidates on a dataset and keep the best.
pub fn train(dataset: &Dataset, config: &TrainConfig) -> EcgResult<TrainOutcome> {
    config.validate()?;

    let labels = dataset.labels();
    let counts = ClassCounts::of(&labels);
    if counts.normal < MIN_PER_CLASS || counts.fa < MIN_PER_CLASS {
        return Err(EcgError::InsufficientTrainingData(format!(
            "need at least {MIN_PER_CLASS} records of each class, found {} Normal and {} FA",
            counts.normal, counts.fa
        )));
    }

    let matrix = dataset.matrix();
    let split = stratified_split(&labels, config.test_ratio, config.seed);
    let train_raw = select(&matrix, &split.train);
    let test_raw = select(&matrix, &split.test);
    let train_labels = select(&labels, &split.train);
    let test_labels = select(&labels, &split.test);

    tracing::info!(
        "Split: {} train, {} test (seed {})",
        train_raw.len(),
        test_raw.len(),
        config.seed
    );

    let scaler = StandardScaler::fit(&train_raw);
    let train_x = scaler.transform_all(&train_raw);
    let test_x = scaler.transform_all(&test_raw);

    let class_weights = ClassWeights::balanced(&train_labels);
    let sample_weights = class_weights.sample_weights(&train_labels);
    tracing::info!(
        "Class weights: Normal={:.3}, FA={:.3}",
        class_weights.normal,
        class_weights.fa
    );

    let candidates = config.unique_candidates();
    let fitted: Vec<(ModelKind, EcgResult<TrainedClassifier>, f64)> = candidates
        .par_iter()
        .map(|&kind| {
            let start = std::time::Instant::now();
            let model = fit_candidate(kind, &train_x, &train_labels, &sample_weights, config);
            (kind, model, start.elapsed().as_secs_f64())
        })
        .collect();

    let mut results = Vec::new();
    let mut best: Option<(TrainedClassifier, ClassificationMetrics)> = None;

    for (kind, model, train_seconds) in fitted {
        let model = match model {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("{} failed to train: {}", kind, e);
                continue;
            }
        };

        let probs = model.predict_batch(&test_x);
        let predicted: Vec<Label> = probs.iter().map(|p| p.label()).collect();
        let scores: Vec<f64> = probs.iter().map(|p| p.fa).collect();
        let metrics = ClassificationMetrics::compute(&test_labels, &predicted, &scores);

        tracing::info!(
            "{}: roc_auc={:.4} f1={:.4} accuracy={:.4} sensitivity={:.4} specificity={:.4}",
            kind,
            metrics.roc_auc,
            metrics.f1,
            metrics.accuracy,
            metrics.sensitivity,
            metrics.specificity
        );

        results.push(CandidateResult {
            model: kind,
            metrics: metrics.clone(),
            train_seconds,
        });

        let replace = match &best {
            None => true,
            Some((_, best_metrics)) => is_better(&metrics, best_metrics),
        };
        if replace {
            best = Some((model, metrics));
        }
    }

    let (model, best_metrics) =
        best.ok_or_else(|| EcgError::Training("every candidate failed to train".into()))?;
    tracing::info!(
        "Selected {} (roc_auc={:.4})",
        model.kind(),
        best_metrics.roc_auc
    );

    let report = TrainingReport {
        trained_at: Utc::now(),
        selected: model.kind(),
        candidates: results,
        train_counts: ClassCounts::of(&train_labels),
        test_counts: ClassCounts::of(&test_labels),
        class_weights,
        test_ratio: config.test_ratio,
        seed: config.seed,
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
    };

    Ok(TrainOutcome {
        scaler,
        model,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ConfusionMatrix;
    use crate::dataset::DatasetRow;
    use crate::features::extract_features;

    /// FA rows get jittery intervals, Normal rows near-constant ones.
    fn synthetic_dataset(normal: usize, fa: usize) -> Dataset {
        let mut rows = Vec::new();
        for i in 0..normal {
            let base = 0.8 + (i % 5) as f64 * 0.02;
            let rr: Vec<f64> = (0..40).map(|k| base + ((k * 7 + i) % 3) as f64 * 0.005).collect();
            rows.push(row(&format!("n{i}"), &rr, Label::Normal));
        }
        for i in 0..fa {
            let rr: Vec<f64> = (0..40)
                .map(|k| 0.45 + ((k * 13 + i * 5) % 11) as f64 * 0.08)
                .collect();
            rows.push(row(&format!("f{i}"), &rr, Label::Fa));
        }
        Dataset::new(rows)
    }

    fn row(name: &str, rr: &[f64], label: Label) -> DatasetRow {
        DatasetRow {
            features: extract_features(name, rr, rr.len() + 1, 128.0).unwrap(),
            label,
            record_name: name.to_string(),
            dataset: "synthetic".into(),
            subset: "main".into(),
        }
    }

    fn fast_config() -> TrainConfig {
        TrainConfig {
            gradient_boosting: GbdtConfig {
                num_trees: 20,
                ..GbdtConfig::default()
            },
            logistic_regression: LogisticConfig {
                epochs: 300,
                ..LogisticConfig::default()
            },
            neural_network: MlpConfig {
                epochs: 50,
                ..MlpConfig::default()
            },
            ..TrainConfig::default()
        }
    }

    fn metrics(roc_auc: f64, f1: f64) -> ClassificationMetrics {
        ClassificationMetrics {
            accuracy: 0.0,
            precision: 0.0,
            sensitivity: 0.0,
            specificity: 0.0,
            f1,
            roc_auc,
            confusion: ConfusionMatrix::default(),
        }
    }

    #[test]
    fn test_train_config_default() {
        let config = TrainConfig::default();
        assert_eq!(config.test_ratio, 0.2);
        assert_eq!(config.seed, 42);
        assert_eq!(config.candidates.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tie_break_order() {
        assert!(is_better(&metrics(0.9, 0.5), &metrics(0.8, 0.9)));
        assert!(is_better(&metrics(0.9, 0.8), &metrics(0.9, 0.7)));
        // Exact tie keeps the earlier candidate
        assert!(!is_better(&metrics(0.9, 0.8), &metrics(0.9, 0.8)));
        assert!(!is_better(&metrics(0.7, 1.0), &metrics(0.9, 0.1)));
    }

    #[test]
    fn test_train_selects_and_reports() {
        let dataset = synthetic_dataset(12, 30);
        let outcome = train(&dataset, &fast_config()).expect("training should succeed");
        let report = &outcome.report;

        assert_eq!(report.candidates.len(), 3);
        assert_eq!(report.train_counts.normal + report.test_counts.normal, 12);
        assert_eq!(report.train_counts.fa + report.test_counts.fa, 30);
        assert_eq!(report.test_counts.fa, 6);
        assert_eq!(outcome.model.kind(), report.selected);

        let best = report.selected_result().unwrap();
        for c in &report.candidates {
            assert!(
                c.metrics.roc_auc <= best.metrics.roc_auc,
                "{} beat the selected model",
                c.model
            );
        }
        // Clearly separable data
        assert!(best.metrics.roc_auc > 0.9, "roc_auc = {}", best.metrics.roc_auc);
        assert_eq!(report.feature_names.len(), NUM_FEATURES);
    }

    #[test]
    fn test_insufficient_data_rejected() {
        let dataset = synthetic_dataset(1, 10);
        assert!(matches!(
            train(&dataset, &fast_config()),
            Err(EcgError::InsufficientTrainingData(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dataset = synthetic_dataset(5, 5);
        let config = TrainConfig {
            test_ratio: 1.5,
            ..fast_config()
        };
        assert!(train(&dataset, &config).is_err());

        let config = TrainConfig {
            candidates: vec![],
            ..fast_config()
        };
        assert!(train(&dataset, &config).is_err());
    }

    #[test]
    fn test_duplicate_candidates_trained_once() {
        let dataset = synthetic_dataset(6, 6);
        let config = TrainConfig {
            candidates: vec![ModelKind::LogisticRegression, ModelKind::LogisticRegression],
            ..fast_config()
        };
        let outcome = train(&dataset, &config).unwrap();
        assert_eq!(outcome.report.candidates.len(), 1);
        assert_eq!(outcome.report.selected, ModelKind::LogisticRegression);
    }
}
