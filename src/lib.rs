//! afib-detect: atrial fibrillation vs normal sinus rhythm from R-R intervals
//!
//! Pipeline stages, each usable on its own:
//!
//! - [`record`]: WFDB header/annotation reading and dataset discovery
//! - [`features`]: R-R intervals and the fixed 15-feature vector
//! - [`dataset`]: batch extraction into a labeled CSV table
//! - [`classifier`]: scaling, candidate training, selection and artifacts
//! - [`scoring`]: applying persisted artifacts to new records
//! - [`evaluate`]: balanced re-scoring of labeled records

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod models;
pub mod record;
pub mod scoring;
