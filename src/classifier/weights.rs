//! Balanced class weights: `w_c = n / (2 * n_c)`

use serde::{Deserialize, Serialize};

use crate::models::Label;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub normal: f64,
    pub fa: f64,
}

impl ClassWeights {
    /// Weights that make both classes contribute equally to the loss. A class
    /// with no examples gets weight 0.
    pub fn balanced(labels: &[Label]) -> Self {
        let n = labels.len() as f64;
        let weight = |class: Label| {
            let n_c = labels.iter().filter(|l| **l == class).count();
            if n_c == 0 {
                0.0
            } else {
                n / (2.0 * n_c as f64)
            }
        };
        Self {
            normal: weight(Label::Normal),
            fa: weight(Label::Fa),
        }
    }

    pub fn uniform() -> Self {
        Self {
            normal: 1.0,
            fa: 1.0,
        }
    }

    pub fn for_label(&self, label: Label) -> f64 {
        match label {
            Label::Normal => self.normal,
            Label::Fa => self.fa,
        }
    }

    pub fn sample_weights(&self, labels: &[Label]) -> Vec<f64> {
        labels.iter().map(|l| self.for_label(*l)).collect()
    }
}
