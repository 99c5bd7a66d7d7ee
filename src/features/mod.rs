//! R-R interval features
//!
//! Beat positions → R-R intervals (seconds) → 15 ordered statistical
//! descriptors. Variability features (CV, RMSSD) carry most of the signal for
//! separating atrial fibrillation from sinus rhythm.

pub mod extractor;
pub mod intervals;
pub mod stats;

pub use extractor::{
    extract_features, extract_from_record, FeatureVector, RhythmRegularity, FEATURE_NAMES,
    NUM_FEATURES,
};
pub use intervals::{record_rr_intervals, rr_intervals};
