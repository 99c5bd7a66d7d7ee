//! Record discovery under a data root
//!
//! Expected layout:
//!
//! ```text
//! <root>/aftdb/learning-set/*.hea   FA, annotations in .qrs
//! <root>/aftdb/test-set-a/*.hea
//! <root>/aftdb/test-set-b/*.hea
//! <root>/nsrdb/*.hea                Normal, annotations in .atr
//! ```
//!
//! The annotation suffix is fixed per dataset family and stamped onto every
//! discovered [`RecordRef`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::{AnnotationSuffix, Label, Provenance, RecordRef};

/// Subsets of the AF termination database; all are atrial fibrillation.
pub const AFTDB_SUBSETS: [&str; 3] = ["learning-set", "test-set-a", "test-set-b"];

/// Subset tag for datasets without sub-folders.
pub const MAIN_SUBSET: &str = "main";

/// Known dataset families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetFamily {
    /// PhysioNet AF Termination Challenge Database
    Aftdb,
    /// MIT-BIH Normal Sinus Rhythm Database
    Nsrdb,
}

impl DatasetFamily {
    pub fn all() -> [DatasetFamily; 2] {
        [DatasetFamily::Aftdb, DatasetFamily::Nsrdb]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DatasetFamily::Aftdb => "aftdb",
            DatasetFamily::Nsrdb => "nsrdb",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "aftdb" => Some(DatasetFamily::Aftdb),
            "nsrdb" => Some(DatasetFamily::Nsrdb),
            _ => None,
        }
    }

    pub fn label(&self) -> Label {
        match self {
            DatasetFamily::Aftdb => Label::Fa,
            DatasetFamily::Nsrdb => Label::Normal,
        }
    }

    pub fn annotation_suffix(&self) -> AnnotationSuffix {
        match self {
            DatasetFamily::Aftdb => AnnotationSuffix::Qrs,
            DatasetFamily::Nsrdb => AnnotationSuffix::Atr,
        }
    }

    /// Sub-folders holding records; `None` means records sit directly in the
    /// dataset folder.
    pub fn subsets(&self) -> Option<&'static [&'static str]> {
        match self {
            DatasetFamily::Aftdb => Some(&AFTDB_SUBSETS),
            DatasetFamily::Nsrdb => None,
        }
    }
}

/// Which of a record's files are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileCheck {
    pub dat: bool,
    pub hea: bool,
    pub annotation: bool,
}

impl FileCheck {
    pub fn for_record(reference: &RecordRef) -> Self {
        Self {
            dat: reference.signal_path().exists(),
            hea: reference.header_path().exists(),
            annotation: reference.annotation_path().exists(),
        }
    }

    pub fn complete(&self) -> bool {
        self.dat && self.hea && self.annotation
    }
}

/// Result of scanning the data root
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub records: Vec<RecordRef>,
    /// Expected folders that do not exist
    pub missing_dirs: Vec<PathBuf>,
}

impl DiscoveryReport {
    pub fn count(&self, label: Label) -> usize {
        self.records
            .iter()
            .filter(|r| r.label == Some(label))
            .count()
    }

    pub fn count_subset(&self, dataset: &str, subset: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.provenance.dataset == dataset && r.provenance.subset == subset)
            .count()
    }
}

/// One line of a structure check
#[derive(Debug, Clone, Serialize)]
pub struct StructureCheck {
    pub path: PathBuf,
    pub exists: bool,
    /// Number of `.hea` headers found
    pub headers: usize,
    /// Headers missing a companion file
    pub incomplete: Vec<String>,
}

/// Data root with the dataset layout described in the module docs
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_dir(&self, family: DatasetFamily) -> PathBuf {
        self.root.join(family.name())
    }

    /// Folders that hold records for a family, tagged with their subset name
    fn record_dirs(&self, family: DatasetFamily) -> Vec<(String, PathBuf)> {
        let base = self.dataset_dir(family);
        match family.subsets() {
            Some(subsets) => subsets
                .iter()
                .map(|s| (s.to_string(), base.join(s)))
                .collect(),
            None => vec![(MAIN_SUBSET.to_string(), base)],
        }
    }

    /// Reference to a record given its provenance, as stored in the dataset
    /// table. Returns `None` for an unknown dataset family.
    pub fn record_ref(&self, dataset: &str, subset: &str, record_name: &str) -> Option<RecordRef> {
        let family = DatasetFamily::from_name(dataset)?;
        let dir = match family.subsets() {
            Some(_) => self.dataset_dir(family).join(subset),
            None => self.dataset_dir(family),
        };
        Some(RecordRef {
            record_name: record_name.to_string(),
            base_path: dir.join(record_name),
            annotation_suffix: family.annotation_suffix(),
            label: Some(family.label()),
            provenance: Provenance::new(family.name(), subset),
        })
    }

    /// Find every record of every family. Records within a folder are sorted
    /// by name so the result is stable across platforms.
    pub fn discover(&self) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        for family in DatasetFamily::all() {
            for (subset, dir) in self.record_dirs(family) {
                if !dir.is_dir() {
                    tracing::warn!("Folder '{}' not found", dir.display());
                    report.missing_dirs.push(dir);
                    continue;
                }
                for name in header_stems(&dir) {
                    report.records.push(RecordRef {
                        base_path: dir.join(&name),
                        record_name: name,
                        annotation_suffix: family.annotation_suffix(),
                        label: Some(family.label()),
                        provenance: Provenance::new(family.name(), subset.clone()),
                    });
                }
            }
            tracing::info!(
                "Dataset {}: {} records found",
                family.name(),
                report
                    .records
                    .iter()
                    .filter(|r| r.provenance.dataset == family.name())
                    .count()
            );
        }

        report
    }

    /// Check that every expected folder exists and every header has its
    /// signal and annotation files.
    pub fn check_structure(&self) -> Vec<StructureCheck> {
        let mut checks = Vec::new();
        for family in DatasetFamily::all() {
            for (subset, dir) in self.record_dirs(family) {
                if !dir.is_dir() {
                    checks.push(StructureCheck {
                        path: dir,
                        exists: false,
                        headers: 0,
                        incomplete: Vec::new(),
                    });
                    continue;
                }
                let names = header_stems(&dir);
                let incomplete = names
                    .iter()
                    .filter(|name| {
                        self.record_ref(family.name(), &subset, name)
                            .map(|r| !FileCheck::for_record(&r).complete())
                            .unwrap_or(true)
                    })
                    .cloned()
                    .collect();
                checks.push(StructureCheck {
                    path: dir,
                    exists: true,
                    headers: names.len(),
                    incomplete,
                });
            }
        }
        checks
    }
}

/// Stems of `*.hea` files in a folder, sorted. Backup headers such as
/// `16265.hea-` have a different extension and are skipped.
fn header_stems(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Cannot list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut stems: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|x| x.to_str()) == Some("hea"))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect();
    stems.sort();
    stems
}
