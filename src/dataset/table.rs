//! Labeled feature table and its CSV form
//!
//! Header: the 15 feature names in `FEATURE_NAMES` order, then
//! `label,record_name,dataset,subset`. Reading accepts any column order but
//! always assembles vectors in `FEATURE_NAMES` order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EcgError, EcgResult};
use crate::features::{FeatureVector, FEATURE_NAMES, NUM_FEATURES};
use crate::models::Label;

const META_COLUMNS: [&str; 4] = ["label", "record_name", "dataset", "subset"];

/// One labeled example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub features: FeatureVector,
    pub label: Label,
    pub record_name: String,
    pub dataset: String,
    pub subset: String,
}

/// Ordered rows of labeled feature vectors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn count(&self, label: Label) -> usize {
        self.rows.iter().filter(|r| r.label == label).count()
    }

    /// Feature matrix in `FEATURE_NAMES` order, one row per example
    pub fn matrix(&self) -> Vec<[f64; NUM_FEATURES]> {
        self.rows.iter().map(|r| r.features.to_array()).collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// Write the table as CSV, creating parent directories as needed.
    pub fn write_csv(&self, path: &Path) -> EcgResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

        let header: Vec<&str> = FEATURE_NAMES
            .iter()
            .copied()
            .chain(META_COLUMNS.iter().copied())
            .collect();
        writer.write_record(&header).map_err(csv_error)?;

        for row in &self.rows {
            let mut fields: Vec<String> = row
                .features
                .to_array()
                .iter()
                .map(|v| v.to_string())
                .collect();
            fields.push(row.label.as_u8().to_string());
            fields.push(row.record_name.clone());
            fields.push(row.dataset.clone());
            fields.push(row.subset.clone());
            writer.write_record(&fields).map_err(csv_error)?;
        }

        writer.flush()?;
        tracing::info!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Read a table written by [`Dataset::write_csv`] (or any CSV carrying
    /// the same columns).
    pub fn read_csv(path: &Path) -> EcgResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let headers = reader.headers().map_err(csv_error)?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let mut feature_idx = [0usize; NUM_FEATURES];
        let mut missing = Vec::new();
        for (slot, name) in feature_idx.iter_mut().zip(FEATURE_NAMES) {
            match column(name) {
                Some(i) => *slot = i,
                None => missing.push(name),
            }
        }
        let label_idx = column("label");
        if label_idx.is_none() {
            missing.push("label");
        }
        if !missing.is_empty() {
            return Err(EcgError::Dataset(format!(
                "{}: missing column(s): {}",
                path.display(),
                missing.join(", ")
            )));
        }
        let label_idx = label_idx.unwrap_or_default();
        let name_idx = column("record_name");
        let dataset_idx = column("dataset");
        let subset_idx = column("subset");

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result.map_err(csv_error)?;
            // Header is line 1
            let line = line + 2;
            let field = |i: usize| record.get(i).unwrap_or("");

            let mut values = [0.0f64; NUM_FEATURES];
            for (k, (&i, name)) in feature_idx.iter().zip(FEATURE_NAMES).enumerate() {
                values[k] = field(i).parse::<f64>().map_err(|_| {
                    EcgError::Dataset(format!(
                        "line {line}: invalid value '{}' for {name}",
                        field(i)
                    ))
                })?;
            }

            let label = field(label_idx)
                .parse::<u8>()
                .ok()
                .and_then(Label::from_u8)
                .ok_or_else(|| {
                    EcgError::Dataset(format!(
                        "line {line}: label must be 0 or 1, got '{}'",
                        field(label_idx)
                    ))
                })?;

            let text = |idx: Option<usize>, default: &str| {
                idx.map(|i| field(i).to_string())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| default.to_string())
            };

            rows.push(DatasetRow {
                features: FeatureVector::from_array(values),
                label,
                record_name: text(name_idx, &format!("row{}", line - 1)),
                dataset: text(dataset_idx, "unknown"),
                subset: text(subset_idx, "main"),
            });
        }

        tracing::info!("Loaded {} rows from {}", rows.len(), path.display());
        Ok(Self { rows })
    }
}

fn csv_error(e: csv::Error) -> EcgError {
    EcgError::Dataset(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract_features;

    fn row(name: &str, rr: &[f64], label: Label) -> DatasetRow {
        DatasetRow {
            features: extract_features(name, rr, rr.len() + 1, 128.0).unwrap(),
            label,
            record_name: name.to_string(),
            dataset: "nsrdb".to_string(),
            subset: "main".to_string(),
        }
    }

    #[test]
    fn test_csv_write_read_preserves_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out/dataset.csv");
        let ds = Dataset::new(vec![
            row("16265", &[0.8, 0.81, 0.79], Label::Normal),
            row("n01", &[0.6, 1.1, 0.45, 1.3], Label::Fa),
        ]);
        ds.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("num_beats,num_rr_intervals,sampling_freq,rr_mean"));
        assert!(header.ends_with("mean_hr_bpm,label,record_name,dataset,subset"));

        let loaded = Dataset::read_csv(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.count(Label::Fa), 1);
        assert_eq!(loaded.rows()[1].record_name, "n01");
        assert_eq!(loaded.matrix(), ds.matrix());
    }

    #[test]
    fn test_read_reorders_columns_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("shuffled.csv");

        let mut names: Vec<&str> = FEATURE_NAMES.iter().rev().copied().collect();
        names.push("label");
        let values: Vec<String> = (0..NUM_FEATURES).rev().map(|i| i.to_string()).collect();
        let content = format!("{}\n{},1\n", names.join(","), values.join(","));
        std::fs::write(&path, content).unwrap();

        let ds = Dataset::read_csv(&path).unwrap();
        let expected: Vec<f64> = (0..NUM_FEATURES).map(|i| i as f64).collect();
        assert_eq!(ds.matrix()[0].to_vec(), expected);
        assert_eq!(ds.rows()[0].label, Label::Fa);
        assert_eq!(ds.rows()[0].dataset, "unknown");
    }

    #[test]
    fn test_missing_feature_column_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.csv");
        std::fs::write(&path, "rr_mean,label\n0.8,0\n").unwrap();

        let err = Dataset::read_csv(&path).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing column"), "{msg}");
        assert!(msg.contains("rr_cv"), "{msg}");
    }

    #[test]
    fn test_bad_label_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad_label.csv");
        let zeros = vec!["0"; NUM_FEATURES].join(",");
        std::fs::write(
            &path,
            format!("{},label\n{},7\n", FEATURE_NAMES.join(","), zeros),
        )
        .unwrap();
        assert!(matches!(
            Dataset::read_csv(&path),
            Err(EcgError::Dataset(_))
        ));
    }
}
