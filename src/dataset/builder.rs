//! Dataset Builder: records in, labeled feature table out
//!
//! Every record passes through load, validate, R-R transform and feature
//! extraction. A failure at any stage produces [`RecordOutcome::Failed`] for
//! that record only; the batch always completes.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use super::table::{Dataset, DatasetRow};
use crate::error::EcgError;
use crate::features::extract_from_record;
use crate::models::{Label, RecordRef};
use crate::record::RecordSource;

/// Result of processing one record
#[derive(Debug)]
pub enum RecordOutcome {
    Extracted(DatasetRow),
    Failed { record: RecordRef, error: EcgError },
}

/// Success and failure counts for one group (a class or a source dataset)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub extracted: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    fn merge(mut self, other: Self) -> Self {
        self.extracted += other.extracted;
        self.failed += other.failed;
        self
    }
}

/// Summary of a failed record, kept in the build report
#[derive(Debug, Clone, Serialize)]
pub struct FailedRecord {
    pub record_name: String,
    pub dataset: String,
    pub kind: &'static str,
    pub message: String,
}

/// Counts folded over all outcomes
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    pub total: OutcomeCounts,
    pub by_class: BTreeMap<String, OutcomeCounts>,
    pub by_dataset: BTreeMap<String, OutcomeCounts>,
}

impl BuildStats {
    fn from_outcome(outcome: &RecordOutcome) -> Self {
        let (label, dataset, counts) = match outcome {
            RecordOutcome::Extracted(row) => (
                Some(row.label),
                row.dataset.clone(),
                OutcomeCounts {
                    extracted: 1,
                    failed: 0,
                },
            ),
            RecordOutcome::Failed { record, .. } => (
                record.label,
                record.provenance.dataset.clone(),
                OutcomeCounts {
                    extracted: 0,
                    failed: 1,
                },
            ),
        };

        let class = label.map_or_else(|| "unlabeled".to_string(), |l| l.to_string());
        Self {
            total: counts,
            by_class: BTreeMap::from([(class, counts)]),
            by_dataset: BTreeMap::from([(dataset, counts)]),
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.total = self.total.merge(other.total);
        for (k, v) in other.by_class {
            let e = self.by_class.entry(k).or_default();
            *e = e.merge(v);
        }
        for (k, v) in other.by_dataset {
            let e = self.by_dataset.entry(k).or_default();
            *e = e.merge(v);
        }
        self
    }
}

/// Output of a build: the table plus what was skipped and why
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub dataset: Dataset,
    pub stats: BuildStats,
    pub failures: Vec<FailedRecord>,
}

impl BuildReport {
    pub fn extracted(&self) -> usize {
        self.stats.total.extracted
    }

    pub fn failed(&self) -> usize {
        self.stats.total.failed
    }
}

/// Applies feature extraction across a collection of record references
pub struct DatasetBuilder<'a, S: RecordSource> {
    source: &'a S,
}

impl<'a, S: RecordSource> DatasetBuilder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Process a single record. Unlabeled references are rejected since a
    /// dataset row needs ground truth.
    pub fn process(&self, reference: &RecordRef) -> RecordOutcome {
        let Some(label) = reference.label else {
            return RecordOutcome::Failed {
                record: reference.clone(),
                error: EcgError::Dataset(format!(
                    "record {} has no label",
                    reference.record_name
                )),
            };
        };

        let result = self
            .source
            .load(reference)
            .and_then(|record| extract_from_record(&record));

        match result {
            Ok(features) => RecordOutcome::Extracted(DatasetRow {
                features,
                label,
                record_name: reference.record_name.clone(),
                dataset: reference.provenance.dataset.clone(),
                subset: reference.provenance.subset.clone(),
            }),
            Err(error) => {
                tracing::warn!("Skipping record {}: {}", reference.record_name, error);
                RecordOutcome::Failed {
                    record: reference.clone(),
                    error,
                }
            }
        }
    }

    pub fn build(&self, references: &[RecordRef]) -> BuildReport {
        self.build_with_progress(references, || {})
    }

    /// Build in parallel. `on_record` is called once per processed record and
    /// may be used to drive a progress bar. Row order follows input order.
    pub fn build_with_progress<F>(&self, references: &[RecordRef], on_record: F) -> BuildReport
    where
        F: Fn() + Sync,
    {
        let outcomes: Vec<RecordOutcome> = references
            .par_iter()
            .map(|reference| {
                let outcome = self.process(reference);
                on_record();
                outcome
            })
            .collect();

        let stats = outcomes
            .par_iter()
            .map(BuildStats::from_outcome)
            .reduce(BuildStats::default, BuildStats::merge);

        let mut rows = Vec::with_capacity(stats.total.extracted);
        let mut failures = Vec::with_capacity(stats.total.failed);
        for outcome in outcomes {
            match outcome {
                RecordOutcome::Extracted(row) => rows.push(row),
                RecordOutcome::Failed { record, error } => failures.push(FailedRecord {
                    record_name: record.record_name,
                    dataset: record.provenance.dataset,
                    kind: error.kind(),
                    message: error.to_string(),
                }),
            }
        }

        tracing::info!(
            "Dataset built: {} records extracted, {} failed ({} FA, {} Normal)",
            stats.total.extracted,
            stats.total.failed,
            rows.iter().filter(|r| r.label == Label::Fa).count(),
            rows.iter().filter(|r| r.label == Label::Normal).count(),
        );

        BuildReport {
            dataset: Dataset::new(rows),
            stats,
            failures,
        }
    }
}
