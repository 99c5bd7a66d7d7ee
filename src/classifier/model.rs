//! Neural network candidate
//!
//! Small 2-layer MLP implemented in pure Rust.
//! Architecture: Input → Linear(hidden) → ReLU → Linear(2) → Softmax

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EcgError, EcgResult};
use crate::features::NUM_FEATURES;
use crate::models::Label;

/// Per-class probabilities for one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub normal: f64,
    pub fa: f64,
}

impl ClassProbabilities {
    /// Build from P(FA), clamped into [0, 1].
    pub fn from_fa(p_fa: f64) -> Self {
        let fa = if p_fa.is_finite() { p_fa.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            normal: 1.0 - fa,
            fa,
        }
    }

    /// Hard label: FA when `fa >= 0.5`.
    pub fn label(&self) -> Label {
        if self.fa >= 0.5 {
            Label::Fa
        } else {
            Label::Normal
        }
    }

    /// Probability of the predicted label
    pub fn confidence(&self) -> f64 {
        self.normal.max(self.fa)
    }

    pub fn for_label(&self, label: Label) -> f64 {
        match label {
            Label::Normal => self.normal,
            Label::Fa => self.fa,
        }
    }
}

/// Training hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    pub hidden_size: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    /// Seed for weight init and per-epoch shuffling
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_size: 16,
            learning_rate: 0.01,
            epochs: 300,
            seed: 42,
        }
    }
}

/// 2-layer MLP classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpClassifier {
    /// First layer weights [hidden_size x input_size]
    w1: Vec<Vec<f64>>,
    /// First layer bias [hidden_size]
    b1: Vec<f64>,
    /// Second layer weights [2 x hidden_size]
    w2: Vec<Vec<f64>>,
    /// Second layer bias [2]
    b2: Vec<f64>,
    input_size: usize,
    hidden_size: usize,
}

struct Forward {
    hidden: Vec<f64>,
    probs: [f64; 2],
}

impl MlpClassifier {
    /// He-initialized weights from a seeded generator
    pub fn new(input_size: usize, hidden_size: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let scale1 = (2.0 / input_size as f64).sqrt();
        let scale2 = (2.0 / hidden_size as f64).sqrt();

        let w1 = (0..hidden_size)
            .map(|_| {
                (0..input_size)
                    .map(|_| rng.random_range(-scale1..scale1))
                    .collect()
            })
            .collect();
        let w2 = (0..2)
            .map(|_| {
                (0..hidden_size)
                    .map(|_| rng.random_range(-scale2..scale2))
                    .collect()
            })
            .collect();

        Self {
            w1,
            b1: vec![0.0; hidden_size],
            w2,
            b2: vec![0.0; 2],
            input_size,
            hidden_size,
        }
    }

    /// Train from scratch with weighted per-sample SGD.
    pub fn fit(
        rows: &[[f64; NUM_FEATURES]],
        labels: &[Label],
        sample_weights: &[f64],
        config: &MlpConfig,
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
        if config.hidden_size == 0 {
            return Err(EcgError::Training("hidden_size must be positive".into()));
        }

        let mut model = Self::new(NUM_FEATURES, config.hidden_size, config.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1));
        let mut order: Vec<usize> = (0..rows.len()).collect();

        for epoch in 0..config.epochs {
            order.shuffle(&mut rng);
            let loss = model.train_step(&order, rows, labels, sample_weights, config.learning_rate);
            if epoch % 50 == 0 || epoch + 1 == config.epochs {
                tracing::debug!("mlp epoch {}/{}: loss={:.4}", epoch + 1, config.epochs, loss);
            }
        }

        Ok(model)
    }

    /// Verify layer dimensions against the feature count. `forward` indexes
    /// every layer by `hidden_size` and assumes these hold.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.input_size != NUM_FEATURES {
            return Err(format!(
                "network input size is {}, expected {}",
                self.input_size, NUM_FEATURES
            ));
        }
        if self.hidden_size == 0 {
            return Err("network hidden size is 0".into());
        }
        if self.w1.len() != self.hidden_size || self.b1.len() != self.hidden_size {
            return Err(format!(
                "first layer has {} weight rows and {} biases, expected {}",
                self.w1.len(),
                self.b1.len(),
                self.hidden_size
            ));
        }
        if let Some(row) = self.w1.iter().find(|r| r.len() != self.input_size) {
            return Err(format!(
                "first layer row has {} weights, expected {}",
                row.len(),
                self.input_size
            ));
        }
        if self.w2.len() != 2 || self.b2.len() != 2 {
            return Err(format!(
                "output layer has {} weight rows and {} biases, expected 2",
                self.w2.len(),
                self.b2.len()
            ));
        }
        if let Some(row) = self.w2.iter().find(|r| r.len() != self.hidden_size) {
            return Err(format!(
                "output layer row has {} weights, expected {}",
                row.len(),
                self.hidden_size
            ));
        }
        Ok(())
    }

    fn forward(&self, x: &[f64]) -> Forward {
        // Layer 1: Linear + ReLU
        let mut hidden = vec![0.0; self.hidden_size];
        for (i, h) in hidden.iter_mut().enumerate() {
            let sum: f64 = self.b1[i]
                + self.w1[i]
                    .iter()
                    .zip(x.iter())
                    .map(|(w, v)| w * v)
                    .sum::<f64>();
            *h = sum.max(0.0);
        }

        // Layer 2: Linear
        let mut logits = [0.0; 2];
        for (i, logit) in logits.iter_mut().enumerate() {
            *logit = self.b2[i]
                + self.w2[i]
                    .iter()
                    .zip(hidden.iter())
                    .map(|(w, h)| w * h)
                    .sum::<f64>();
        }

        // Softmax
        let max_logit = logits[0].max(logits[1]);
        let exp0 = (logits[0] - max_logit).exp();
        let exp1 = (logits[1] - max_logit).exp();
        let sum = exp0 + exp1;

        Forward {
            hidden,
            probs: [exp0 / sum, exp1 / sum],
        }
    }

    /// Index 0 is Normal, index 1 is FA.
    pub fn predict(&self, row: &[f64; NUM_FEATURES]) -> ClassProbabilities {
        let f = self.forward(row);
        ClassProbabilities {
            normal: f.probs[0],
            fa: f.probs[1],
        }
    }

    /// One pass over `order`, updating after each sample. Returns the
    /// weighted mean cross-entropy.
    fn train_step(
        &mut self,
        order: &[usize],
        rows: &[[f64; NUM_FEATURES]],
        labels: &[Label],
        sample_weights: &[f64],
        learning_rate: f64,
    ) -> f64 {
        let mut total_loss = 0.0;
        let mut total_weight = 0.0;

        for &idx in order {
            let x = &rows[idx];
            let weight = sample_weights[idx];
            let target = labels[idx].as_u8() as usize;

            let Forward { hidden, probs } = self.forward(x);
            total_loss += -weight * probs[target].max(1e-12).ln();
            total_weight += weight;

            // Gradient of softmax + cross-entropy, scaled by sample weight
            let mut d_logits = probs;
            d_logits[target] -= 1.0;
            for d in d_logits.iter_mut() {
                *d *= weight;
            }

            // Hidden gradient uses W2 before its update
            let mut d_hidden = vec![0.0; self.hidden_size];
            for (j, dh) in d_hidden.iter_mut().enumerate() {
                if hidden[j] > 0.0 {
                    *dh = d_logits[0] * self.w2[0][j] + d_logits[1] * self.w2[1][j];
                }
            }

            for i in 0..2 {
                self.b2[i] -= learning_rate * d_logits[i];
                for j in 0..self.hidden_size {
                    self.w2[i][j] -= learning_rate * d_logits[i] * hidden[j];
                }
            }

            for i in 0..self.hidden_size {
                self.b1[i] -= learning_rate * d_hidden[i];
                for j in 0..self.input_size.min(x.len()) {
                    self.w1[i][j] -= learning_rate * d_hidden[i] * x[j];
                }
            }
        }

        if total_weight > 0.0 {
            total_loss / total_weight
        } else {
            0.0
        }
    }
}
