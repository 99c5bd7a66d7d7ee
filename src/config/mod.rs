//! Configuration module for afib-detect
//!
//! One `PipelineConfig` carries the data paths, trainer settings and
//! evaluation sampling parameters. It is loaded once by the CLI and passed
//! explicitly to every stage.

mod pipeline_config;

pub use pipeline_config::{
    PathsConfig, PipelineConfig, ENV_DATA_ROOT, ENV_MODELS_DIR, PROJECT_CONFIG_FILE,
};
