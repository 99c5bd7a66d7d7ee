//! Pipeline configuration
//!
//! Supports loading config from:
//! - An explicit `--config <path>`
//! - `afib.toml` in the working directory
//! - ~/.config/afib-detect/config.toml
//! - Environment variables for the data and model paths

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::{ArtifactPaths, TrainConfig};
use crate::error::{EcgError, EcgResult};
use crate::evaluate::EvaluationConfig;
use crate::record::DataLayout;

/// Project config file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "afib.toml";

pub const ENV_DATA_ROOT: &str = "AFIB_DATA_ROOT";
pub const ENV_MODELS_DIR: &str = "AFIB_MODELS_DIR";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root holding `aftdb/` and `nsrdb/`
    pub data_root: PathBuf,
    /// Feature table written by `extract` and read by `train`/`evaluate`
    pub dataset: PathBuf,
    /// Directory for scaler, model and training report
    pub models_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data/raw"),
            dataset: PathBuf::from("data/processed/dataset.csv"),
            models_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub training: TrainConfig,
    pub evaluation: EvaluationConfig,
}

impl PipelineConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest, paths only)
    /// 2. `explicit` if given, else `./afib.toml`
    /// 3. User config (~/.config/afib-detect/config.toml)
    /// 4. Defaults
    ///
    /// An explicit path that cannot be read or parsed is an error; a broken
    /// implicit file is logged and skipped.
    pub fn load(explicit: Option<&Path>) -> EcgResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::discover(Path::new(PROJECT_CONFIG_FILE)),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn discover(project_path: &Path) -> Self {
        let candidates = std::iter::once(project_path.to_path_buf())
            .chain(Self::user_config_path());
        for path in candidates.filter(|p| p.exists()) {
            match Self::from_file(&path) {
                Ok(config) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => tracing::warn!("Ignoring {}: {}", path.display(), e),
            }
        }
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    pub fn from_file(path: &Path) -> EcgResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| EcgError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content).map_err(|reason| EcgError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Environment variables override file paths. `lookup` is
    /// `std::env::var` in production.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_DATA_ROOT).filter(|v| !v.is_empty()) {
            self.paths.data_root = PathBuf::from(root);
        }
        if let Some(dir) = lookup(ENV_MODELS_DIR).filter(|v| !v.is_empty()) {
            self.paths.models_dir = PathBuf::from(dir);
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("afib-detect").join("config.toml"))
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.paths.data_root)
    }

    pub fn artifacts(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.paths.models_dir)
    }

    /// Write a commented example config to `path` unless one already exists.
    /// Returns whether a file was written.
    pub fn write_example(path: &Path) -> EcgResult<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, EXAMPLE_CONFIG)?;
        Ok(true)
    }
}

const EXAMPLE_CONFIG: &str = r#"# afib-detect configuration

[paths]
# Root holding aftdb/{learning-set,test-set-a,test-set-b} and nsrdb/
data_root = "data/raw"
# Feature table written by `extract`
dataset = "data/processed/dataset.csv"
# scaler.json, best_model.json, training_report.json
models_dir = "models"

[training]
test_ratio = 0.2
seed = 42
# Tie-break order when ROC-AUC and F1 are equal
candidates = ["gradient_boosting", "logistic_regression", "neural_network"]

[training.gradient_boosting]
num_trees = 100
max_depth = 3
learning_rate = 0.1
min_leaf_size = 1

[training.logistic_regression]
learning_rate = 0.1
epochs = 1000
l2 = 1.0

[training.neural_network]
hidden_size = 16
learning_rate = 0.01
epochs = 300

[evaluation]
# Half of the sample is drawn from each class
sample_size = 20
seed = 42
"#;
