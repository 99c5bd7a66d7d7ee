//! Gradient boosting candidate
//!
//! Wraps the `gbdt` crate with the `LogLikelyhood` loss (binary
//! classification), interpreting label 1.0 as FA and -1.0 as Normal.
//! Class balance is handled through per-sample weights.
//!
//! Note: the gbdt crate internally uses `f32` (`ValueType`), while feature
//! rows are `f64`. Conversions happen at the crate boundary.

use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use super::model::ClassProbabilities;
use crate::error::{EcgError, EcgResult};
use crate::features::NUM_FEATURES;
use crate::models::Label;

// ---------------------------------------------------------------------------
// f64 <-> f32 helpers
// ---------------------------------------------------------------------------

#[inline]
fn row_to_f32(row: &[f64; NUM_FEATURES]) -> Vec<f32> {
    row.iter().map(|&v| v as f32).collect()
}

#[inline]
fn label_to_target(label: Label) -> f32 {
    match label {
        Label::Fa => 1.0,
        Label::Normal => -1.0,
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Boosting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtConfig {
    /// Number of boosting iterations
    pub num_trees: usize,
    pub max_depth: u32,
    /// Shrinkage / step size
    pub learning_rate: f64,
    pub min_leaf_size: usize,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_leaf_size: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around `gbdt::gradient_boost::GBDT` over standardized rows
#[derive(Serialize, Deserialize)]
pub struct GbdtClassifier {
    model: GBDT,
}

impl std::fmt::Debug for GbdtClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GbdtClassifier").finish_non_exhaustive()
    }
}

impl GbdtClassifier {
    /// Train a new model.
    pub fn fit(
        rows: &[[f64; NUM_FEATURES]],
        labels: &[Label],
        sample_weights: &[f64],
        config: &GbdtConfig,
    ) -> EcgResult<Self> {
        if rows.is_empty() {
            return Err(EcgError::Training("no training samples provided".into()));
        }
        if rows.len() != labels.len() || rows.len() != sample_weights.len() {
            return Err(EcgError::Training(format!(
                "row count ({}) does not match label count ({}) or weight count ({})",
                rows.len(),
                labels.len(),
                sample_weights.len()
            )));
        }

        let mut cfg = Config::new();
        cfg.set_feature_size(NUM_FEATURES);
        cfg.set_max_depth(config.max_depth);
        cfg.set_iterations(config.num_trees);
        cfg.set_shrinkage(config.learning_rate as f32);
        cfg.set_loss("LogLikelyhood");
        cfg.set_debug(false);
        cfg.set_training_optimization_level(2);
        cfg.set_min_leaf_size(config.min_leaf_size);

        let mut gbdt = GBDT::new(&cfg);

        let mut training_data: Vec<Data> = rows
            .iter()
            .zip(labels.iter())
            .zip(sample_weights.iter())
            .map(|((row, &label), &weight)| {
                Data::new_training_data(row_to_f32(row), weight as f32, label_to_target(label), None)
            })
            .collect();

        gbdt.fit(&mut training_data);

        Ok(Self { model: gbdt })
    }

    /// P(FA) for a batch of standardized rows.
    pub fn predict_batch(&self, rows: &[[f64; NUM_FEATURES]]) -> Vec<ClassProbabilities> {
        if rows.is_empty() {
            return Vec::new();
        }

        let data: Vec<Data> = rows
            .iter()
            .map(|r| Data::new_test_data(row_to_f32(r), None))
            .collect();

        self.model
            .predict(&data)
            .into_iter()
            .map(|p| ClassProbabilities::from_fa(p as f64))
            .collect()
    }

    pub fn predict(&self, row: &[f64; NUM_FEATURES]) -> ClassProbabilities {
        let data = vec![Data::new_test_data(row_to_f32(row), None)];
        let p_fa = self.model.predict(&data).first().copied().unwrap_or(0.5_f32) as f64;
        ClassProbabilities::from_fa(p_fa)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
