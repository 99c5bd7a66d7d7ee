//! Core data models for the ECG pipeline
//!
//! These models are used throughout the crate for representing
//! records, where to load them from, and their ground-truth labels.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EcgError, EcgResult};

/// Binary rhythm label. `Fa` (atrial fibrillation) is the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Normal,
    Fa,
}

impl Label {
    /// Numeric encoding used in the dataset table (0 = Normal, 1 = FA).
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Normal => 0,
            Label::Fa => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Label::Normal),
            1 => Some(Label::Fa),
            _ => None,
        }
    }

    pub fn is_positive(self) -> bool {
        self == Label::Fa
    }

    /// Long human-readable class name
    pub fn class_name(self) -> &'static str {
        match self {
            Label::Normal => "Normal Sinus Rhythm",
            Label::Fa => "Atrial Fibrillation",
        }
    }

    pub fn all() -> [Label; 2] {
        [Label::Normal, Label::Fa]
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Normal => write!(f, "Normal"),
            Label::Fa => write!(f, "FA"),
        }
    }
}

/// Annotation file suffix. Each dataset family uses exactly one of these and
/// it is carried explicitly with every record; it is never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationSuffix {
    /// QRS detector output (AFTDB)
    Qrs,
    /// Reference beat annotations (NSRDB)
    Atr,
}

impl AnnotationSuffix {
    pub fn extension(self) -> &'static str {
        match self {
            AnnotationSuffix::Qrs => "qrs",
            AnnotationSuffix::Atr => "atr",
        }
    }
}

impl std::fmt::Display for AnnotationSuffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where a record came from. Not used in feature computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub dataset: String,
    pub subset: String,
}

impl Provenance {
    pub fn new(dataset: impl Into<String>, subset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            subset: subset.into(),
        }
    }
}

impl Default for Provenance {
    fn default() -> Self {
        Self::new("unknown", "main")
    }
}

/// One ECG recording reduced to its annotated beat positions
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub record_id: String,
    /// Sample indices of annotated beats, strictly increasing
    pub beat_positions: Vec<u64>,
    /// Sampling frequency in Hz
    pub sampling_frequency: f64,
    /// Ground truth, absent at inference time
    pub label: Option<Label>,
    pub provenance: Provenance,
}

impl Record {
    pub fn new(
        record_id: impl Into<String>,
        beat_positions: Vec<u64>,
        sampling_frequency: f64,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            beat_positions,
            sampling_frequency,
            label: None,
            provenance: Provenance::default(),
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn num_beats(&self) -> usize {
        self.beat_positions.len()
    }

    /// Check the record's preconditions: at least two beats, a usable
    /// sampling frequency, and strictly increasing beat positions.
    pub fn validate(&self) -> EcgResult<()> {
        if self.beat_positions.len() < 2 {
            return Err(EcgError::InsufficientBeats {
                record_id: self.record_id.clone(),
                found: self.beat_positions.len(),
            });
        }
        if !(self.sampling_frequency.is_finite() && self.sampling_frequency > 0.0) {
            return Err(EcgError::InvalidSamplingFrequency {
                record_id: self.record_id.clone(),
                value: self.sampling_frequency,
            });
        }
        if let Some(index) = self
            .beat_positions
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(EcgError::NonMonotonicBeats {
                record_id: self.record_id.clone(),
                index: index + 1,
            });
        }
        Ok(())
    }
}

/// Reference to a record on disk: base path (no extension) plus the explicit
/// annotation suffix and metadata needed to label it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub record_name: String,
    pub base_path: PathBuf,
    pub annotation_suffix: AnnotationSuffix,
    pub label: Option<Label>,
    pub provenance: Provenance,
}

impl RecordRef {
    /// Build an unlabeled reference from a user-supplied path. A trailing
    /// `.hea` or `.dat` extension is stripped.
    pub fn from_path(path: &Path, annotation_suffix: AnnotationSuffix) -> Self {
        let base_path = match path.extension().and_then(|e| e.to_str()) {
            Some("hea") | Some("dat") => path.with_extension(""),
            _ => path.to_path_buf(),
        };
        let record_name = base_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            record_name,
            base_path,
            annotation_suffix,
            label: None,
            provenance: Provenance::default(),
        }
    }

    pub fn header_path(&self) -> PathBuf {
        with_suffix(&self.base_path, "hea")
    }

    pub fn signal_path(&self) -> PathBuf {
        with_suffix(&self.base_path, "dat")
    }

    pub fn annotation_path(&self) -> PathBuf {
        with_suffix(&self.base_path, self.annotation_suffix.extension())
    }
}

/// Append an extension without clobbering dots already in the record name.
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
