//! Weighted logistic regression with L2 penalty
//!
//! Full-batch gradient descent on standardized features. Labels are encoded
//! 1 for FA and 0 for Normal; per-sample weights scale each example's
//! contribution to the loss.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{EcgError, EcgResult};
use crate::features::NUM_FEATURES;
use crate::models::Label;

/// Hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 strength (inverse of C)
    pub l2: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 1000,
            l2: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub weights: Vec<f64>,
    pub bias: f64,
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    pub fn fit(
        rows: &[[f64; NUM_FEATURES]],
        labels: &[Label],
        sample_weights: &[f64],
        config: &LogisticConfig,
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

        let n = rows.len();
        let x = DMatrix::from_fn(n, NUM_FEATURES, |i, j| rows[i][j]);
        let y = DVector::from_iterator(n, labels.iter().map(|l| l.as_u8() as f64));
        let sw = DVector::from_column_slice(sample_weights);
        let total_weight = sw.sum();
        if total_weight <= 0.0 {
            return Err(EcgError::Training("sample weights sum to zero".into()));
        }

        let mut w = DVector::<f64>::zeros(NUM_FEATURES);
        let mut b = 0.0;
        // sklearn-style objective: sum(weighted log loss) + l2/2 * |w|^2,
        // scaled by total weight so the step size is independent of n.
        let l2 = config.l2 / total_weight;

        for _ in 0..config.epochs {
            let z = (&x * &w).add_scalar(b);
            let residual = z.map(sigmoid) - &y;
            let weighted = residual.component_mul(&sw);

            let grad_w = x.tr_mul(&weighted) / total_weight + &w * l2;
            let grad_b = weighted.sum() / total_weight;

            w -= grad_w * config.learning_rate;
            b -= grad_b * config.learning_rate;
        }

        Ok(Self {
            weights: w.iter().copied().collect(),
            bias: b,
        })
    }

    /// P(FA) for one standardized row
    pub fn predict_fa(&self, row: &[f64; NUM_FEATURES]) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(row.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }

    /// Reject parameters that do not cover one weight per feature.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.weights.len() != NUM_FEATURES {
            return Err(format!(
                "logistic regression has {} weights, expected {}",
                self.weights.len(),
                NUM_FEATURES
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(v: f64) -> [f64; NUM_FEATURES] {
        let mut r = [0.0; NUM_FEATURES];
        r[8] = v;
        r[9] = v * 0.5;
        r
    }

    #[test]
    fn test_sigmoid_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_learns_separable_data() {
        let rows: Vec<_> = [-2.0, -1.5, -1.0, 1.0, 1.5, 2.0].iter().map(|&v| row(v)).collect();
        let labels = [Label::Normal, Label::Normal, Label::Normal, Label::Fa, Label::Fa, Label::Fa];
        let model =
            LogisticRegression::fit(&rows, &labels, &[1.0; 6], &LogisticConfig::default()).unwrap();

        assert!(model.predict_fa(&row(2.0)) > 0.8);
        assert!(model.predict_fa(&row(-2.0)) < 0.2);
        assert!(model.weights[8] > 0.0);
    }

    #[test]
    fn test_weights_shift_the_boundary() {
        // Overlapping points; upweighting FA should raise P(FA) at the overlap
        let rows: Vec<_> = [-1.0, 0.0, 0.0, 1.0].iter().map(|&v| row(v)).collect();
        let labels = [Label::Normal, Label::Normal, Label::Fa, Label::Fa];
        let cfg = LogisticConfig::default();
        let even = LogisticRegression::fit(&rows, &labels, &[1.0; 4], &cfg).unwrap();
        let fa_heavy = LogisticRegression::fit(&rows, &labels, &[1.0, 1.0, 5.0, 5.0], &cfg).unwrap();
        assert!(fa_heavy.predict_fa(&row(0.0)) > even.predict_fa(&row(0.0)));
    }

    #[test]
    fn test_rejects_bad_input() {
        let cfg = LogisticConfig::default();
        assert!(LogisticRegression::fit(&[], &[], &[], &cfg).is_err());
        assert!(LogisticRegression::fit(&[row(1.0)], &[Label::Fa], &[1.0, 2.0], &cfg).is_err());
    }

    #[test]
    fn test_check_shape() {
        let full = LogisticRegression {
            weights: vec![0.1; NUM_FEATURES],
            bias: 0.0,
        };
        assert!(full.check_shape().is_ok());

        let truncated = LogisticRegression {
            weights: vec![0.1; 3],
            bias: 0.0,
        };
        let err = truncated.check_shape().unwrap_err();
        assert!(err.contains("3 weights"), "unexpected message: {err}");
    }
}
