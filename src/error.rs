//! Error taxonomy for the ECG pipeline
//!
//! Per-record errors (`InsufficientBeats`, `RecordUnreadable`,
//! `EmptyIntervalSequence`, ...) are recoverable: batch operations catch them
//! at the record boundary and keep going. `ModelArtifactMissing` is fatal to
//! scoring-engine startup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur anywhere in the pipeline
#[derive(Error, Debug)]
pub enum EcgError {
    #[error("record {record_id}: need at least 2 beat positions, found {found}")]
    InsufficientBeats { record_id: String, found: usize },

    #[error("record {record_id}: cannot read {path}: {reason}")]
    RecordUnreadable {
        record_id: String,
        path: PathBuf,
        reason: String,
    },

    #[error("record {record_id}: no usable R-R intervals")]
    EmptyIntervalSequence { record_id: String },

    #[error("record {record_id}: sampling frequency must be positive and finite, got {value}")]
    InvalidSamplingFrequency { record_id: String, value: f64 },

    #[error("record {record_id}: beat positions not strictly increasing at index {index}")]
    NonMonotonicBeats { record_id: String, index: usize },

    #[error("Model artifact not found: {path}. Run `afib-detect train` first.")]
    ModelArtifactMissing { path: PathBuf },

    #[error("Failed to (de)serialize artifact {path}: {reason}")]
    Artifact { path: PathBuf, reason: String },

    #[error("Not enough training data: {0}")]
    InsufficientTrainingData(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Invalid configuration in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EcgError {
    /// True for errors that only affect a single record and can be skipped.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            EcgError::InsufficientBeats { .. }
                | EcgError::RecordUnreadable { .. }
                | EcgError::EmptyIntervalSequence { .. }
                | EcgError::InvalidSamplingFrequency { .. }
                | EcgError::NonMonotonicBeats { .. }
        )
    }

    /// Short machine-friendly name, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EcgError::InsufficientBeats { .. } => "insufficient_beats",
            EcgError::RecordUnreadable { .. } => "record_unreadable",
            EcgError::EmptyIntervalSequence { .. } => "empty_interval_sequence",
            EcgError::InvalidSamplingFrequency { .. } => "invalid_sampling_frequency",
            EcgError::NonMonotonicBeats { .. } => "non_monotonic_beats",
            EcgError::ModelArtifactMissing { .. } => "model_artifact_missing",
            EcgError::Artifact { .. } => "artifact",
            EcgError::InsufficientTrainingData(_) => "insufficient_training_data",
            EcgError::Training(_) => "training",
            EcgError::Dataset(_) => "dataset",
            EcgError::Config { .. } => "config",
            EcgError::Io(_) => "io",
        }
    }
}

pub type EcgResult<T> = Result<T, EcgError>;
