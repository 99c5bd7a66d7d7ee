//! Per-feature standardization: `(x - mean) / scale`
//!
//! Fit only on the training partition. Scoring and evaluation call
//! `transform`, never `fit`.

use serde::{Deserialize, Serialize};

use crate::features::{FEATURE_NAMES, NUM_FEATURES};
use crate::features::stats;

/// Fitted normalization parameters, one `(mean, scale)` pair per feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Feature order the parameters were fit against
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on a feature matrix. Features with zero variance get scale 1 so
    /// they transform to zero instead of dividing by zero.
    pub fn fit(rows: &[[f64; NUM_FEATURES]]) -> Self {
        let mut mean = Vec::with_capacity(NUM_FEATURES);
        let mut scale = Vec::with_capacity(NUM_FEATURES);

        for j in 0..NUM_FEATURES {
            let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            let std = stats::std_dev(&column);
            mean.push(stats::mean(&column));
            scale.push(if std > 0.0 && std.is_finite() { std } else { 1.0 });
        }

        Self {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            mean,
            scale,
        }
    }

    pub fn transform(&self, row: &[f64; NUM_FEATURES]) -> [f64; NUM_FEATURES] {
        let mut out = [0.0; NUM_FEATURES];
        for (j, v) in out.iter_mut().enumerate() {
            *v = (row[j] - self.mean[j]) / self.scale[j];
        }
        out
    }

    pub fn transform_all(&self, rows: &[[f64; NUM_FEATURES]]) -> Vec<[f64; NUM_FEATURES]> {
        rows.iter().map(|r| self.transform(r)).collect()
    }

    /// Check a deserialized scaler still matches the current feature schema.
    pub fn check_schema(&self) -> Result<(), String> {
        if self.mean.len() != NUM_FEATURES || self.scale.len() != NUM_FEATURES {
            return Err(format!(
                "scaler has {} means and {} scales, expected {}",
                self.mean.len(),
                self.scale.len(),
                NUM_FEATURES
            ));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err("scaler feature order does not match FEATURE_NAMES".into());
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err("scaler contains a zero or non-finite scale".into());
        }
        Ok(())
    }
}
