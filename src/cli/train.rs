//! Train command - fit every candidate, keep the best, persist artifacts

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use afib_detect::classifier::{self, ArtifactPaths};
use afib_detect::config::PipelineConfig;
use afib_detect::dataset::Dataset;

use super::pct;

/// Command-line values that take precedence over the config file
pub struct Overrides {
    pub dataset: Option<PathBuf>,
    pub models_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub test_ratio: Option<f64>,
}

pub fn run(config: PipelineConfig, overrides: Overrides, json: bool) -> Result<()> {
    let dataset_path = overrides.dataset.unwrap_or(config.paths.dataset);
    let artifacts = ArtifactPaths::new(overrides.models_dir.unwrap_or(config.paths.models_dir));
    let mut train_config = config.training;
    if let Some(seed) = overrides.seed {
        train_config.seed = seed;
    }
    if let Some(ratio) = overrides.test_ratio {
        train_config.test_ratio = ratio;
    }

    let dataset = Dataset::read_csv(&dataset_path)
        .with_context(|| format!("Failed to read dataset {}", dataset_path.display()))?;

    if !json {
        println!(
            "\n{} Training on {} records from {}\n",
            style("🧠").bold(),
            style(dataset.len()).cyan(),
            dataset_path.display()
        );
    }

    let start = Instant::now();
    let outcome = classifier::train(&dataset, &train_config).context("Training failed")?;
    artifacts
        .save(&outcome)
        .with_context(|| format!("Failed to save artifacts to {}", artifacts.dir.display()))?;
    let report = &outcome.report;

    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "  Train: {} FA / {} Normal    Test: {} FA / {} Normal",
        report.train_counts.fa,
        report.train_counts.normal,
        report.test_counts.fa,
        report.test_counts.normal
    );
    println!(
        "  Class weights: FA {:.3}, Normal {:.3}\n",
        report.class_weights.fa, report.class_weights.normal
    );

    println!(
        "  {:<22} {:>8} {:>9} {:>8} {:>8} {:>8} {:>8}",
        "Model", "ROC-AUC", "Accuracy", "Sens", "Spec", "F1", "Time"
    );
    for candidate in &report.candidates {
        let m = &candidate.metrics;
        let marker = if candidate.model == report.selected {
            style("★").yellow().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:<22} {:>8.4} {:>9} {:>8} {:>8} {:>8.4} {:>7.2}s",
            marker,
            candidate.model.display_name(),
            m.roc_auc,
            pct(m.accuracy),
            pct(m.sensitivity),
            pct(m.specificity),
            m.f1,
            candidate.train_seconds
        );
    }

    if let Some(best) = report.selected_result() {
        let c = &best.metrics.confusion;
        println!("\n  Confusion matrix ({}):", best.model.display_name());
        println!("                 pred Normal  pred FA");
        println!("    Normal      {:>11} {:>8}", c.tn, c.fp);
        println!("    FA          {:>11} {:>8}", c.fn_, c.tp);
    }

    println!(
        "\n{} Selected {} ({:.1}s)",
        style("✓").green(),
        style(report.selected.display_name()).cyan(),
        start.elapsed().as_secs_f64()
    );
    println!(
        "{} Artifacts saved to {}",
        style("✓").green(),
        style(artifacts.dir.display()).cyan()
    );
    Ok(())
}
