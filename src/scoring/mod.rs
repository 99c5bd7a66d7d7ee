//! Scoring Engine: persisted scaler + classifier applied to new records
//!
//! Artifacts are loaded once at construction; a missing artifact is fatal
//! there and never surfaces per call. Scoring only ever calls
//! `StandardScaler::transform`, so the fitted normalization is never touched
//! after training. The engine is immutable and can be shared across threads.

use serde::Serialize;

use crate::classifier::{ArtifactPaths, ClassProbabilities, ModelKind, ModelBundle};
use crate::error::EcgResult;
use crate::features::{extract_from_record, FeatureVector, RhythmRegularity};
use crate::models::{Label, Record, RecordRef};
use crate::record::RecordSource;

/// Prediction for one record
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub record_id: String,
    pub predicted_label: Label,
    /// Probability of the predicted label, in [0.5, 1]
    pub confidence: f64,
    pub probability_normal: f64,
    pub probability_fa: f64,
    pub features: FeatureVector,
    pub regularity: RhythmRegularity,
}

impl ScoredRecord {
    fn new(record_id: &str, features: FeatureVector, probs: ClassProbabilities) -> Self {
        Self {
            record_id: record_id.to_string(),
            predicted_label: probs.label(),
            confidence: probs.confidence(),
            probability_normal: probs.normal,
            probability_fa: probs.fa,
            regularity: features.regularity(),
            features,
        }
    }
}

pub struct ScoringEngine {
    bundle: ModelBundle,
}

impl ScoringEngine {
    /// Load artifacts from a models directory.
    pub fn load(paths: &ArtifactPaths) -> EcgResult<Self> {
        let bundle = paths.load_bundle()?;
        tracing::info!(
            "Scoring engine ready: {} from {}",
            bundle.model.kind(),
            paths.dir.display()
        );
        Ok(Self { bundle })
    }

    pub fn from_bundle(bundle: ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn model_kind(&self) -> ModelKind {
        self.bundle.model.kind()
    }

    /// Score an already extracted feature vector.
    pub fn score_features(&self, record_id: &str, features: FeatureVector) -> ScoredRecord {
        let row = self.bundle.scaler.transform(&features.to_array());
        let probs = self.bundle.model.predict(&row);
        ScoredRecord::new(record_id, features, probs)
    }

    /// Validate, transform and score an in-memory record.
    pub fn score_record(&self, record: &Record) -> EcgResult<ScoredRecord> {
        let features = extract_from_record(record)?;
        let scored = self.score_features(&record.record_id, features);
        tracing::debug!(
            "{}: {} (P(FA)={:.3})",
            scored.record_id,
            scored.predicted_label,
            scored.probability_fa
        );
        Ok(scored)
    }

    /// Load a record through `source` and score it.
    pub fn score_ref<S: RecordSource>(
        &self,
        source: &S,
        reference: &RecordRef,
    ) -> EcgResult<ScoredRecord> {
        let record = source.load(reference)?;
        self.score_record(&record)
    }
}
