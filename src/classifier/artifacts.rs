//! Artifact Store: persisted scaler, model and training report
//!
//! Layout under the models directory:
//!
//! ```text
//! scaler.json           StandardScaler
//! best_model.json       TrainedClassifier (tagged by "kind")
//! training_report.json  TrainingReport
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::scaler::StandardScaler;
use super::train::{TrainOutcome, TrainingReport};
use super::TrainedClassifier;
use crate::error::{EcgError, EcgResult};

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "best_model.json";
pub const REPORT_FILE: &str = "training_report.json";

/// File locations of every artifact in one models directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn scaler(&self) -> PathBuf {
        self.dir.join(SCALER_FILE)
    }

    pub fn model(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn report(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }

    /// Artifacts required for scoring that do not exist
    pub fn missing(&self) -> Vec<PathBuf> {
        [self.scaler(), self.model()]
            .into_iter()
            .filter(|p| !p.exists())
            .collect()
    }

    /// Write scaler, model and report, creating the directory if needed.
    pub fn save(&self, outcome: &TrainOutcome) -> EcgResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        write_json(&self.scaler(), &outcome.scaler)?;
        write_json(&self.model(), &outcome.model)?;
        write_json(&self.report(), &outcome.report)?;
        tracing::info!("Artifacts saved to {}", self.dir.display());
        Ok(())
    }

    /// Load what scoring needs. A missing file is `ModelArtifactMissing`.
    pub fn load_bundle(&self) -> EcgResult<ModelBundle> {
        let scaler: StandardScaler = read_json(&self.scaler())?;
        scaler.check_schema().map_err(|reason| EcgError::Artifact {
            path: self.scaler(),
            reason,
        })?;
        let model: TrainedClassifier = read_json(&self.model())?;
        model.check_shape().map_err(|reason| EcgError::Artifact {
            path: self.model(),
            reason,
        })?;
        Ok(ModelBundle { scaler, model })
    }

    pub fn load_report(&self) -> EcgResult<TrainingReport> {
        read_json(&self.report())
    }
}

/// Scaler and classifier as loaded for scoring
#[derive(Debug)]
pub struct ModelBundle {
    pub scaler: StandardScaler,
    pub model: TrainedClassifier,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> EcgResult<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| EcgError::Artifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, content)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> EcgResult<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EcgError::ModelArtifactMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&content).map_err(|e| EcgError::Artifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
