//! Binary classification metrics with FA as the positive class

use serde::{Deserialize, Serialize};

use crate::models::Label;

/// Counts of predicted vs. actual labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// FA predicted as FA
    pub tp: usize,
    /// Normal predicted as Normal
    pub tn: usize,
    /// Normal predicted as FA
    pub fp: usize,
    /// FA predicted as Normal
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(actual: &[Label], predicted: &[Label]) -> Self {
        let mut m = Self::default();
        for (a, p) in actual.iter().zip(predicted) {
            match (a, p) {
                (Label::Fa, Label::Fa) => m.tp += 1,
                (Label::Normal, Label::Normal) => m.tn += 1,
                (Label::Normal, Label::Fa) => m.fp += 1,
                (Label::Fa, Label::Normal) => m.fn_ += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Test-partition metrics for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    /// Recall on FA
    pub sensitivity: f64,
    /// Recall on Normal
    pub specificity: f64,
    pub f1: f64,
    pub roc_auc: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationMetrics {
    /// `scores` are P(FA) per sample, used for ROC-AUC.
    pub fn compute(actual: &[Label], predicted: &[Label], scores: &[f64]) -> Self {
        let c = ConfusionMatrix::from_predictions(actual, predicted);
        let precision = ratio(c.tp, c.tp + c.fp);
        let sensitivity = ratio(c.tp, c.tp + c.fn_);
        let f1 = if precision + sensitivity > 0.0 {
            2.0 * precision * sensitivity / (precision + sensitivity)
        } else {
            0.0
        };

        Self {
            accuracy: ratio(c.tp + c.tn, c.total()),
            precision,
            sensitivity,
            specificity: ratio(c.tn, c.tn + c.fp),
            f1,
            roc_auc: roc_auc(actual, scores),
            confusion: c,
        }
    }
}

/// Area under the ROC curve via the Mann-Whitney rank statistic. Tied scores
/// share their average rank. Returns 0.5 when only one class is present.
pub fn roc_auc(actual: &[Label], scores: &[f64]) -> f64 {
    let n_pos = actual.iter().filter(|l| l.is_positive()).count();
    let n_neg = actual.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 averaged
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = actual
        .iter()
        .zip(&ranks)
        .filter(|(l, _)| l.is_positive())
        .map(|(_, r)| r)
        .sum();
    let n_pos = n_pos as f64;
    (pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Label::{Fa, Normal};

    #[test]
    fn test_confusion_and_rates() {
        let actual = [Fa, Fa, Fa, Normal, Normal];
        let predicted = [Fa, Fa, Normal, Normal, Fa];
        let m = ClassificationMetrics::compute(&actual, &predicted, &[0.9, 0.8, 0.4, 0.1, 0.6]);
        assert_eq!(m.confusion, ConfusionMatrix { tp: 2, tn: 1, fp: 1, fn_: 1 });
        assert!((m.accuracy - 0.6).abs() < 1e-12);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.sensitivity - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.specificity - 0.5).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_perfect_and_inverted() {
        let actual = [Normal, Normal, Fa, Fa];
        assert_eq!(roc_auc(&actual, &[0.1, 0.2, 0.8, 0.9]), 1.0);
        assert_eq!(roc_auc(&actual, &[0.9, 0.8, 0.2, 0.1]), 0.0);
    }

    #[test]
    fn test_roc_auc_ties_average() {
        // All scores tied: no discrimination
        let actual = [Normal, Fa, Normal, Fa];
        assert!((roc_auc(&actual, &[0.5; 4]) - 0.5).abs() < 1e-12);

        // One positive tied with one negative: 3 wins + 1 half out of 4 pairs
        let actual = [Normal, Normal, Fa, Fa];
        let auc = roc_auc(&actual, &[0.1, 0.7, 0.7, 0.9]);
        assert!((auc - 0.875).abs() < 1e-12, "auc = {auc}");
    }

    #[test]
    fn test_roc_auc_single_class() {
        assert_eq!(roc_auc(&[Fa, Fa], &[0.2, 0.9]), 0.5);
    }

    #[test]
    fn test_no_positive_predictions() {
        let m = ClassificationMetrics::compute(&[Fa, Normal], &[Normal, Normal], &[0.3, 0.1]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.specificity, 1.0);
    }
}
