//! Fixed-schema 15-feature extractor over one record's R-R intervals
//!
//! Feature groups:
//!   0..3  : Record metadata (beat count, interval count, sampling frequency)
//!   3..8  : Central tendency and spread (mean, std, median, min, max)
//!   8..11 : Variability (CV, RMSSD, range)
//!  11..14 : Quartiles (P25, P75, IQR)
//!  14     : Mean heart rate
//!
//! `FEATURE_NAMES` is the only definition of the column order. The scaler and
//! every classifier are order-sensitive, so anything that flattens a
//! `FeatureVector` (training matrix, CSV, scoring) goes through `to_array`.

use serde::{Deserialize, Serialize};

use super::intervals::record_rr_intervals;
use super::stats;
use crate::error::{EcgError, EcgResult};
use crate::models::Record;

/// Number of features produced by the extractor.
pub const NUM_FEATURES: usize = 15;

/// Feature names, in extraction order.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "num_beats",
    "num_rr_intervals",
    "sampling_freq",
    "rr_mean",
    "rr_std",
    "rr_median",
    "rr_min",
    "rr_max",
    "rr_cv",
    "rr_rmssd",
    "rr_range",
    "rr_percentile_25",
    "rr_percentile_75",
    "rr_iqr",
    "mean_hr_bpm",
];

/// CV above which a rhythm reads as irregular (percent).
pub const IRREGULAR_CV_PCT: f64 = 15.0;

/// CV below which a rhythm reads as regular (percent).
pub const REGULAR_CV_PCT: f64 = 5.0;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// Statistical descriptors of one record. R-R values are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub num_beats: usize,
    pub num_rr_intervals: usize,
    pub sampling_freq: f64,
    pub rr_mean: f64,
    pub rr_std: f64,
    pub rr_median: f64,
    pub rr_min: f64,
    pub rr_max: f64,
    /// Coefficient of variation, percent
    pub rr_cv: f64,
    pub rr_rmssd: f64,
    pub rr_range: f64,
    pub rr_percentile_25: f64,
    pub rr_percentile_75: f64,
    pub rr_iqr: f64,
    pub mean_hr_bpm: f64,
}

impl FeatureVector {
    /// Flatten in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [
            self.num_beats as f64,
            self.num_rr_intervals as f64,
            self.sampling_freq,
            self.rr_mean,
            self.rr_std,
            self.rr_median,
            self.rr_min,
            self.rr_max,
            self.rr_cv,
            self.rr_rmssd,
            self.rr_range,
            self.rr_percentile_25,
            self.rr_percentile_75,
            self.rr_iqr,
            self.mean_hr_bpm,
        ]
    }

    /// Rebuild from values in `FEATURE_NAMES` order.
    pub fn from_array(values: [f64; NUM_FEATURES]) -> Self {
        Self {
            num_beats: values[0].max(0.0).round() as usize,
            num_rr_intervals: values[1].max(0.0).round() as usize,
            sampling_freq: values[2],
            rr_mean: values[3],
            rr_std: values[4],
            rr_median: values[5],
            rr_min: values[6],
            rr_max: values[7],
            rr_cv: values[8],
            rr_rmssd: values[9],
            rr_range: values[10],
            rr_percentile_25: values[11],
            rr_percentile_75: values[12],
            rr_iqr: values[13],
            mean_hr_bpm: values[14],
        }
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.to_array()[i])
    }

    /// (name, value) pairs in order, for display.
    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES.iter().copied().zip(self.to_array()).collect()
    }

    pub fn regularity(&self) -> RhythmRegularity {
        RhythmRegularity::from_cv(self.rr_cv)
    }
}

/// Coarse reading of R-R variability used when reviewing a prediction by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmRegularity {
    /// CV below 5%: consistent with sinus rhythm
    Regular,
    Borderline,
    /// CV above 15%: consistent with atrial fibrillation
    Irregular,
}

impl RhythmRegularity {
    pub fn from_cv(rr_cv: f64) -> Self {
        if rr_cv > IRREGULAR_CV_PCT {
            RhythmRegularity::Irregular
        } else if rr_cv < REGULAR_CV_PCT {
            RhythmRegularity::Regular
        } else {
            RhythmRegularity::Borderline
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RhythmRegularity::Regular => "low variability, regular rhythm",
            RhythmRegularity::Borderline => "moderate variability",
            RhythmRegularity::Irregular => "high variability, irregular rhythm",
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Compute the feature vector from an R-R sequence plus record metadata.
///
/// Pure and deterministic. An empty sequence is rejected with
/// `EmptyIntervalSequence` so the caller can skip the record.
pub fn extract_features(
    record_id: &str,
    rr: &[f64],
    num_beats: usize,
    sampling_freq: f64,
) -> EcgResult<FeatureVector> {
    if rr.is_empty() {
        return Err(EcgError::EmptyIntervalSequence {
            record_id: record_id.to_string(),
        });
    }

    let sorted = stats::sorted(rr);
    let rr_mean = stats::mean(rr);
    let rr_std = stats::std_dev(rr);
    let rr_min = sorted[0];
    let rr_max = sorted[sorted.len() - 1];
    let p25 = stats::percentile(&sorted, 25.0);
    let p75 = stats::percentile(&sorted, 75.0);

    Ok(FeatureVector {
        num_beats,
        num_rr_intervals: rr.len(),
        sampling_freq,
        rr_mean,
        rr_std,
        rr_median: stats::percentile(&sorted, 50.0),
        rr_min,
        rr_max,
        rr_cv: stats::coefficient_of_variation(rr),
        rr_rmssd: stats::rmssd(rr),
        rr_range: rr_max - rr_min,
        rr_percentile_25: p25,
        rr_percentile_75: p75,
        rr_iqr: p75 - p25,
        mean_hr_bpm: if rr_mean > 0.0 { 60.0 / rr_mean } else { 0.0 },
    })
}

/// Validate a record, derive its R-R intervals and extract features.
pub fn extract_from_record(record: &Record) -> EcgResult<FeatureVector> {
    record.validate()?;
    let rr = record_rr_intervals(record)?;
    extract_features(
        &record.record_id,
        &rr,
        record.num_beats(),
        record.sampling_frequency,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
