//! End-to-end pipeline tests against a synthetic data root
//!
//! discover → build → CSV → train → save → load → score → evaluate

mod common;

use afib_detect::classifier::{self, ArtifactPaths, ModelKind, TrainConfig};
use afib_detect::dataset::{analyze_balance, Dataset, DatasetBuilder, ImbalanceSeverity};
use afib_detect::error::EcgError;
use afib_detect::evaluate::{BatchEvaluator, EvaluationConfig};
use afib_detect::models::{AnnotationSuffix, Label, RecordRef};
use afib_detect::record::{DataLayout, RecordSource, WfdbSource};
use afib_detect::scoring::ScoringEngine;

fn fast_config() -> TrainConfig {
    let mut config = TrainConfig::default();
    config.gradient_boosting.num_trees = 20;
    config.neural_network.epochs = 100;
    config.logistic_regression.epochs = 300;
    config
}

#[test]
fn test_discovery_counts_and_labels() {
    let tmp = tempfile::tempdir().unwrap();
    common::data_root(tmp.path(), 4, 3);

    let report = DataLayout::new(tmp.path()).discover();
    assert_eq!(report.records.len(), 7);
    assert_eq!(report.count(Label::Fa), 4);
    assert_eq!(report.count(Label::Normal), 3);
    assert!(report.missing_dirs.is_empty(), "all folders exist");

    let fa = report
        .records
        .iter()
        .find(|r| r.label == Some(Label::Fa))
        .unwrap();
    assert_eq!(fa.annotation_suffix, AnnotationSuffix::Qrs);
    assert_eq!(fa.provenance.dataset, "aftdb");
    assert_eq!(fa.provenance.subset, "learning-set");
}

#[test]
fn test_missing_folders_are_reported_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    common::write_record(
        &tmp.path().join("nsrdb"),
        "16265",
        &common::beats(20, 0.8, 0.8, 1),
        "atr",
    );

    let report = DataLayout::new(tmp.path()).discover();
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.missing_dirs.len(), 3, "three aftdb subsets missing");
}

#[test]
fn test_build_isolates_bad_records() {
    let tmp = tempfile::tempdir().unwrap();
    common::data_root(tmp.path(), 3, 3);
    // One beat only: no intervals can be formed
    common::write_record(&tmp.path().join("nsrdb"), "19999", &[500], "atr");
    // Header without annotation file
    std::fs::write(tmp.path().join("nsrdb/19998.hea"), "19998 2 128 1000\n").unwrap();

    let refs = DataLayout::new(tmp.path()).discover().records;
    let source = WfdbSource::new();
    let report = DatasetBuilder::new(&source).build(&refs);

    assert_eq!(report.extracted(), 6);
    assert_eq!(report.failed(), 2);
    let kinds: Vec<&str> = report.failures.iter().map(|f| f.kind).collect();
    assert!(kinds.contains(&"insufficient_beats"), "kinds: {kinds:?}");
    assert!(kinds.contains(&"record_unreadable"), "kinds: {kinds:?}");
    assert_eq!(report.stats.by_class["Normal"].failed, 2);
    assert_eq!(report.stats.by_dataset["aftdb"].extracted, 3);
}

#[test]
fn test_dataset_csv_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    common::data_root(tmp.path(), 3, 2);
    let refs = DataLayout::new(tmp.path()).discover().records;
    let source = WfdbSource::new();
    let built = DatasetBuilder::new(&source).build(&refs).dataset;

    let csv_path = tmp.path().join("processed/dataset.csv");
    built.write_csv(&csv_path).unwrap();
    let read = Dataset::read_csv(&csv_path).unwrap();

    assert_eq!(read.len(), built.len());
    assert_eq!(read.labels(), built.labels());
    for (a, b) in read.rows().iter().zip(built.rows()) {
        assert_eq!(a.record_name, b.record_name);
        assert_eq!(a.subset, b.subset);
        for (x, y) in a.features.to_array().iter().zip(b.features.to_array()) {
            assert!((x - y).abs() < 1e-12, "{x} vs {y}");
        }
    }

    let balance = analyze_balance(&read).unwrap();
    assert_eq!(balance.majority, Label::Fa);
    assert_eq!(balance.severity, ImbalanceSeverity::Moderate);
}

#[test]
fn test_train_save_load_score_evaluate() {
    let tmp = tempfile::tempdir().unwrap();
    common::data_root(tmp.path(), 10, 10);
    let layout = DataLayout::new(tmp.path());
    let refs = layout.discover().records;
    let source = WfdbSource::new();
    let dataset = DatasetBuilder::new(&source).build(&refs).dataset;
    assert_eq!(dataset.len(), 20);

    let outcome = classifier::train(&dataset, &fast_config()).expect("training should succeed");
    let report = &outcome.report;
    assert_eq!(report.candidates.len(), 3);
    assert_eq!(report.test_counts.fa, 2);
    assert_eq!(report.test_counts.normal, 2);
    assert_eq!(report.train_counts.fa + report.test_counts.fa, 10);
    let best = report.selected_result().expect("selected candidate is listed");
    for c in &report.candidates {
        assert!(c.metrics.roc_auc <= best.metrics.roc_auc);
    }
    assert!(best.metrics.roc_auc >= 0.9, "separable data: {:?}", best.metrics);

    let artifacts = ArtifactPaths::new(tmp.path().join("models"));
    artifacts.save(&outcome).unwrap();
    assert!(artifacts.missing().is_empty());
    assert_eq!(artifacts.load_report().unwrap().selected, report.selected);

    // Loaded scaler keeps the fitted parameters bit for bit
    let bundle = artifacts.load_bundle().unwrap();
    assert_eq!(bundle.scaler.mean.len(), outcome.scaler.mean.len());
    for (a, b) in bundle.scaler.mean.iter().zip(&outcome.scaler.mean) {
        assert_eq!(a.to_bits(), b.to_bits(), "mean {a} != {b}");
    }
    for (a, b) in bundle.scaler.scale.iter().zip(&outcome.scaler.scale) {
        assert_eq!(a.to_bits(), b.to_bits(), "scale {a} != {b}");
    }

    // and reproduces the rows the models were trained on
    let raw = dataset.matrix();
    let trained_rows = outcome.scaler.transform_all(&raw);
    for (row, expected) in raw.iter().zip(&trained_rows) {
        let reloaded = bundle.scaler.transform(row);
        for (a, b) in reloaded.iter().zip(expected) {
            assert_eq!(a.to_bits(), b.to_bits(), "transformed {a} != {b}");
        }
    }

    // Scoring a record matches the in-memory model
    let engine = ScoringEngine::load(&artifacts).unwrap();
    let fa_ref = refs.iter().find(|r| r.label == Some(Label::Fa)).unwrap();
    let scored = engine.score_ref(&source, fa_ref).unwrap();
    let record = source.load(fa_ref).unwrap();
    let expected = outcome.model.predict(
        &outcome
            .scaler
            .transform(&afib_detect::features::extract_from_record(&record).unwrap().to_array()),
    );
    assert!((scored.probability_fa - expected.fa).abs() < 1e-9);
    assert!((scored.probability_fa + scored.probability_normal - 1.0).abs() < 1e-9);
    assert!(scored.confidence >= 0.5);

    // Balanced evaluation over the dataset's own records
    let evaluator = BatchEvaluator::new(&engine, &source);
    let eval = evaluator.evaluate(
        &refs,
        &EvaluationConfig {
            sample_size: 10,
            seed: 7,
        },
    );
    assert_eq!(eval.total, 10);
    assert_eq!(eval.per_class.iter().map(|c| c.total).sum::<usize>(), 10);
    assert!(eval.per_class.iter().all(|c| c.total == 5));
    assert_eq!(
        eval.correct + eval.misclassified.len() + eval.errors.len(),
        eval.total
    );
    assert!(eval.errors.is_empty());
    assert!(eval.accuracy >= 0.8, "accuracy {}", eval.accuracy);

    // Same seed, same sample
    let again = evaluator.evaluate(
        &refs,
        &EvaluationConfig {
            sample_size: 10,
            seed: 7,
        },
    );
    let names = |r: &afib_detect::evaluate::EvaluationReport| {
        let mut n: Vec<String> = r.results.iter().map(|x| x.record_name.clone()).collect();
        n.sort();
        n
    };
    assert_eq!(names(&eval), names(&again));
}

#[test]
fn test_single_candidate_is_selected() {
    let tmp = tempfile::tempdir().unwrap();
    common::data_root(tmp.path(), 5, 5);
    let refs = DataLayout::new(tmp.path()).discover().records;
    let source = WfdbSource::new();
    let dataset = DatasetBuilder::new(&source).build(&refs).dataset;

    let mut config = fast_config();
    config.candidates = vec![ModelKind::LogisticRegression];
    let outcome = classifier::train(&dataset, &config).unwrap();
    assert_eq!(outcome.report.selected, ModelKind::LogisticRegression);
    assert_eq!(outcome.model.kind(), ModelKind::LogisticRegression);
}

#[test]
fn test_single_class_dataset_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    common::data_root(tmp.path(), 6, 0);
    let refs = DataLayout::new(tmp.path()).discover().records;
    let source = WfdbSource::new();
    let dataset = DatasetBuilder::new(&source).build(&refs).dataset;

    assert!(matches!(
        classifier::train(&dataset, &fast_config()),
        Err(EcgError::InsufficientTrainingData(_))
    ));
}

#[test]
fn test_scoring_without_artifacts_fails_fast() {
    let tmp = tempfile::tempdir().unwrap();
    let result = ScoringEngine::load(&ArtifactPaths::new(tmp.path().join("models")));
    match result {
        Err(EcgError::ModelArtifactMissing { path }) => {
            assert!(path.ends_with("scaler.json"), "{}", path.display())
        }
        Err(other) => panic!("expected ModelArtifactMissing, got {other:?}"),
        Ok(_) => panic!("expected ModelArtifactMissing, got an engine"),
    }
}

#[test]
fn test_predict_path_accepts_extension() {
    let tmp = tempfile::tempdir().unwrap();
    common::data_root(tmp.path(), 0, 1);
    let with_ext = RecordRef::from_path(&tmp.path().join("nsrdb/16000.hea"), AnnotationSuffix::Atr);
    let without = RecordRef::from_path(&tmp.path().join("nsrdb/16000"), AnnotationSuffix::Atr);
    assert_eq!(with_ext.base_path, without.base_path);

    let record = WfdbSource::new().load(&with_ext).unwrap();
    assert_eq!(record.num_beats(), 60);
    assert_eq!(record.sampling_frequency, common::FS as f64);
}
