//! Class balance analysis
//!
//! Summarises how skewed the label distribution is. Training always applies
//! balanced class weights; this report tells the user how much work those
//! weights are doing.

use serde::Serialize;

use super::table::Dataset;
use crate::models::Label;

/// How severe a class imbalance is, graded by majority/minority ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImbalanceSeverity {
    /// ratio < 1.5
    Mild,
    /// ratio < 3
    Moderate,
    /// ratio < 10
    High,
    Severe,
}

impl ImbalanceSeverity {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 1.5 {
            ImbalanceSeverity::Mild
        } else if ratio < 3.0 {
            ImbalanceSeverity::Moderate
        } else if ratio < 10.0 {
            ImbalanceSeverity::High
        } else {
            ImbalanceSeverity::Severe
        }
    }

    /// Suggested handling at this level
    pub fn advice(&self) -> &'static str {
        match self {
            ImbalanceSeverity::Mild => "minimal impact; no special handling needed",
            ImbalanceSeverity::Moderate => "use class weights; check specificity, not just accuracy",
            ImbalanceSeverity::High => "class weights required; consider collecting more minority records",
            ImbalanceSeverity::Severe => "accuracy is misleading; class weights alone may not suffice",
        }
    }
}

impl std::fmt::Display for ImbalanceSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ImbalanceSeverity::Mild => "mild",
            ImbalanceSeverity::Moderate => "moderate",
            ImbalanceSeverity::High => "high",
            ImbalanceSeverity::Severe => "severe",
        };
        f.write_str(s)
    }
}

/// Count and share of one class
#[derive(Debug, Clone, Serialize)]
pub struct ClassShare {
    pub label: Label,
    pub count: usize,
    /// Percent of all rows
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub total: usize,
    pub classes: Vec<ClassShare>,
    /// Majority count over minority count; infinite when a class is absent
    pub imbalance_ratio: f64,
    pub severity: ImbalanceSeverity,
    pub majority: Label,
    /// Accuracy of always predicting the majority class, in percent
    pub majority_baseline_accuracy: f64,
}

/// Analyse the label distribution of a dataset. Returns `None` when empty.
pub fn analyze(dataset: &Dataset) -> Option<BalanceReport> {
    let total = dataset.len();
    if total == 0 {
        return None;
    }

    let classes: Vec<ClassShare> = Label::all()
        .into_iter()
        .map(|label| {
            let count = dataset.count(label);
            ClassShare {
                label,
                count,
                share: count as f64 / total as f64 * 100.0,
            }
        })
        .collect();

    let majority = classes.iter().max_by_key(|c| c.count)?;
    let minority = classes.iter().min_by_key(|c| c.count)?;
    let imbalance_ratio = if minority.count == 0 {
        f64::INFINITY
    } else {
        majority.count as f64 / minority.count as f64
    };

    Some(BalanceReport {
        total,
        imbalance_ratio,
        severity: ImbalanceSeverity::from_ratio(imbalance_ratio),
        majority: majority.label,
        majority_baseline_accuracy: majority.share,
        classes,
    })
}
