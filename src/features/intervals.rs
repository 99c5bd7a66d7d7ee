//! Beat positions -> R-R intervals in seconds

use crate::error::{EcgError, EcgResult};
use crate::models::Record;

/// Convert beat sample positions into R-R intervals (seconds).
///
/// Returns `InsufficientBeats` when fewer than two positions are supplied.
/// Monotonicity is not checked here; callers validate it up front with
/// [`Record::validate`], otherwise zero or negative intervals may appear.
pub fn rr_intervals(
    record_id: &str,
    beat_positions: &[u64],
    sampling_frequency: f64,
) -> EcgResult<Vec<f64>> {
    if beat_positions.len() < 2 {
        return Err(EcgError::InsufficientBeats {
            record_id: record_id.to_string(),
            found: beat_positions.len(),
        });
    }
    if !(sampling_frequency.is_finite() && sampling_frequency > 0.0) {
        return Err(EcgError::InvalidSamplingFrequency {
            record_id: record_id.to_string(),
            value: sampling_frequency,
        });
    }

    Ok(beat_positions
        .windows(2)
        .map(|pair| (pair[1] as f64 - pair[0] as f64) / sampling_frequency)
        .collect())
}

/// Interval transform for a whole record.
pub fn record_rr_intervals(record: &Record) -> EcgResult<Vec<f64>> {
    rr_intervals(
        &record.record_id,
        &record.beat_positions,
        record.sampling_frequency,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_positions() {
        let rr = rr_intervals("r", &[100, 228, 356], 128.0).unwrap();
        assert_eq!(rr, vec![1.0, 1.0]);
    }

    #[test]
    fn test_length_and_sum() {
        let positions = [12_u64, 190, 333, 520, 702, 1001, 1100];
        let fs = 250.0;
        let rr = rr_intervals("r", &positions, fs).unwrap();

        assert_eq!(rr.len(), positions.len() - 1);
        assert!(rr.iter().all(|&v| v > 0.0));
        let expected = (1100.0 - 12.0) / fs;
        assert!((rr.iter().sum::<f64>() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_beats_exactly_below_two() {
        for n in 0..2 {
            let positions: Vec<u64> = (0..n).map(|i| i * 100).collect();
            let err = rr_intervals("r", &positions, 128.0).unwrap_err();
            assert!(matches!(err, EcgError::InsufficientBeats { found, .. } if found == n as usize));
        }
        for n in 2..6 {
            let positions: Vec<u64> = (0..n).map(|i| i * 100).collect();
            assert!(rr_intervals("r", &positions, 128.0).is_ok());
        }
    }

    #[test]
    fn test_non_monotonic_yields_non_positive_interval() {
        let rr = rr_intervals("r", &[300, 200, 200], 100.0).unwrap();
        assert_eq!(rr, vec![-1.0, 0.0]);
    }

    #[test]
    fn test_rejects_zero_frequency() {
        assert!(matches!(
            rr_intervals("r", &[1, 2], 0.0),
            Err(EcgError::InvalidSamplingFrequency { .. })
        ));
    }
}
