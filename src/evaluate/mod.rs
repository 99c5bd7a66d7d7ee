//! Batch Evaluator
//!
//! Draws a class-balanced, seeded sample of labeled records, re-scores each
//! one end to end (load, extract, transform, classify) and aggregates the
//! results. A record that fails to score becomes an error row and counts as
//! incorrect; it never stops the batch.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Label, RecordRef};
use crate::record::RecordSource;
use crate::scoring::{ScoredRecord, ScoringEngine};

/// Sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Total sample size; half is drawn from each class
    pub sample_size: usize,
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            sample_size: 20,
            seed: 42,
        }
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Pick up to `sample_size / 2` labeled references per class, then shuffle
/// the combined sample. Unlabeled references are never chosen.
pub fn balanced_sample(references: &[RecordRef], sample_size: usize, seed: u64) -> Vec<RecordRef> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let per_class = sample_size / 2;
    let mut sample = Vec::with_capacity(per_class * 2);

    for class in [Label::Fa, Label::Normal] {
        let mut pool: Vec<&RecordRef> = references
            .iter()
            .filter(|r| r.label == Some(class))
            .collect();
        if pool.len() < per_class {
            tracing::warn!(
                "Only {} {} records available, wanted {}",
                pool.len(),
                class,
                per_class
            );
        }
        pool.shuffle(&mut rng);
        sample.extend(pool.into_iter().take(per_class).cloned());
    }

    sample.shuffle(&mut rng);
    sample
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Outcome of scoring one sampled record
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Scored(ScoredRecord),
    Error { kind: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordResult {
    pub record_name: String,
    pub dataset: String,
    pub subset: String,
    pub actual: Label,
    pub verdict: Verdict,
}

impl RecordResult {
    pub fn predicted(&self) -> Option<Label> {
        match &self.verdict {
            Verdict::Scored(s) => Some(s.predicted_label),
            Verdict::Error { .. } => None,
        }
    }

    /// Errors are never correct.
    pub fn is_correct(&self) -> bool {
        self.predicted() == Some(self.actual)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassAccuracy {
    pub label: Label,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Misclassified {
    pub record_name: String,
    pub actual: Label,
    pub predicted: Label,
    pub confidence: f64,
    pub rr_cv: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorRow {
    pub record_name: String,
    pub actual: Label,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    /// Correct over total; error rows count as incorrect
    pub accuracy: f64,
    pub per_class: Vec<ClassAccuracy>,
    pub mean_confidence_correct: Option<f64>,
    pub mean_confidence_incorrect: Option<f64>,
    pub misclassified: Vec<Misclassified>,
    pub errors: Vec<ErrorRow>,
    pub results: Vec<RecordResult>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl EvaluationReport {
    pub fn from_results(results: Vec<RecordResult>) -> Self {
        let total = results.len();
        let correct = results.iter().filter(|r| r.is_correct()).count();

        let per_class = Label::all()
            .into_iter()
            .map(|label| {
                let of_class: Vec<&RecordResult> =
                    results.iter().filter(|r| r.actual == label).collect();
                let correct = of_class.iter().filter(|r| r.is_correct()).count();
                ClassAccuracy {
                    label,
                    total: of_class.len(),
                    correct,
                    accuracy: ratio(correct, of_class.len()),
                }
            })
            .collect();

        let mut conf_correct = Vec::new();
        let mut conf_incorrect = Vec::new();
        let mut misclassified = Vec::new();
        let mut errors = Vec::new();

        for r in &results {
            match &r.verdict {
                Verdict::Scored(s) if s.predicted_label == r.actual => {
                    conf_correct.push(s.confidence)
                }
                Verdict::Scored(s) => {
                    conf_incorrect.push(s.confidence);
                    misclassified.push(Misclassified {
                        record_name: r.record_name.clone(),
                        actual: r.actual,
                        predicted: s.predicted_label,
                        confidence: s.confidence,
                        rr_cv: s.features.rr_cv,
                    });
                }
                Verdict::Error { kind, message } => errors.push(ErrorRow {
                    record_name: r.record_name.clone(),
                    actual: r.actual,
                    kind: *kind,
                    message: message.clone(),
                }),
            }
        }

        Self {
            total,
            correct,
            accuracy: ratio(correct, total),
            per_class,
            mean_confidence_correct: mean(&conf_correct),
            mean_confidence_incorrect: mean(&conf_incorrect),
            misclassified,
            errors,
            results,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

pub struct BatchEvaluator<'a, S: RecordSource> {
    engine: &'a ScoringEngine,
    source: &'a S,
}

impl<'a, S: RecordSource> BatchEvaluator<'a, S> {
    pub fn new(engine: &'a ScoringEngine, source: &'a S) -> Self {
        Self { engine, source }
    }

    /// Score exactly the given labeled references, in order.
    pub fn evaluate_refs(&self, references: &[RecordRef]) -> EvaluationReport {
        let results: Vec<RecordResult> = references
            .par_iter()
            .filter_map(|reference| {
                let actual = reference.label?;
                let verdict = match self.engine.score_ref(self.source, reference) {
                    Ok(scored) => Verdict::Scored(scored),
                    Err(e) => {
                        tracing::warn!("Could not score {}: {}", reference.record_name, e);
                        Verdict::Error {
                            kind: e.kind(),
                            message: e.to_string(),
                        }
                    }
                };
                Some(RecordResult {
                    record_name: reference.record_name.clone(),
                    dataset: reference.provenance.dataset.clone(),
                    subset: reference.provenance.subset.clone(),
                    actual,
                    verdict,
                })
            })
            .collect();

        let report = EvaluationReport::from_results(results);
        tracing::info!(
            "Evaluated {} records: {}/{} correct ({:.1}%), {} errors",
            report.total,
            report.correct,
            report.total,
            report.accuracy * 100.0,
            report.errors.len()
        );
        report
    }

    /// Draw a balanced sample from `pool` and evaluate it.
    pub fn evaluate(&self, pool: &[RecordRef], config: &EvaluationConfig) -> EvaluationReport {
        let sample = balanced_sample(pool, config.sample_size, config.seed);
        tracing::info!(
            "Sampled {} of {} records (seed {})",
            sample.len(),
            pool.len(),
            config.seed
        );
        self.evaluate_refs(&sample)
    }
}
