//! Record loading
//!
//! A [`RecordSource`] turns a [`RecordRef`] into a [`Record`]. The default
//! implementation reads WFDB files from disk; tests and embedding callers can
//! supply their own.

pub mod discovery;
pub mod wfdb;

pub use discovery::{DataLayout, DatasetFamily, DiscoveryReport, FileCheck};

use std::path::Path;

use crate::error::{EcgError, EcgResult};
use crate::models::{Record, RecordRef};

/// Anything that can load a record by reference
pub trait RecordSource: Sync {
    fn load(&self, reference: &RecordRef) -> EcgResult<Record>;
}

/// Reads `<base>.hea` for the sampling frequency and `<base>.<suffix>` for
/// beat annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct WfdbSource;

impl WfdbSource {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSource for WfdbSource {
    fn load(&self, reference: &RecordRef) -> EcgResult<Record> {
        let header_path = reference.header_path();
        let header_text = read_to_string(&reference.record_name, &header_path)?;
        let header = wfdb::parse_header(&header_text)
            .map_err(|reason| unreadable(&reference.record_name, &header_path, reason))?;

        let annotation_path = reference.annotation_path();
        let bytes = std::fs::read(&annotation_path)
            .map_err(|e| unreadable(&reference.record_name, &annotation_path, e.to_string()))?;
        let annotations = wfdb::parse_annotations(&bytes)
            .map_err(|reason| unreadable(&reference.record_name, &annotation_path, reason))?;
        let beats = wfdb::beat_positions(&annotations);

        tracing::debug!(
            "loaded {}: fs={} Hz, {} annotations, {} beats",
            reference.record_name,
            header.sampling_frequency,
            annotations.len(),
            beats.len()
        );

        let mut record = Record::new(
            reference.record_name.clone(),
            beats,
            header.sampling_frequency,
        )
        .with_provenance(reference.provenance.clone());
        record.label = reference.label;
        Ok(record)
    }
}

fn read_to_string(record_id: &str, path: &Path) -> EcgResult<String> {
    std::fs::read_to_string(path).map_err(|e| unreadable(record_id, path, e.to_string()))
}

fn unreadable(record_id: &str, path: &Path, reason: String) -> EcgError {
    EcgError::RecordUnreadable {
        record_id: record_id.to_string(),
        path: path.to_path_buf(),
        reason,
    }
}
