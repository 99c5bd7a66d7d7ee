//! Balance command - class distribution of the feature table

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use afib_detect::config::PipelineConfig;
use afib_detect::dataset::{analyze_balance, Dataset, ImbalanceSeverity};

pub fn run(config: &PipelineConfig, dataset: Option<PathBuf>, json: bool) -> Result<()> {
    let path = dataset.unwrap_or_else(|| config.paths.dataset.clone());
    let dataset = Dataset::read_csv(&path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;

    let Some(report) = analyze_balance(&dataset) else {
        anyhow::bail!("Dataset {} has no rows", path.display());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{} Class balance ({} records)\n", style("⚖").bold(), report.total);
    for class in &report.classes {
        let bar_len = (class.share / 2.0).round() as usize;
        println!(
            "  {:<7} {:>5}  {:>5.1}%  {}",
            class.label.to_string(),
            class.count,
            class.share,
            style("█".repeat(bar_len)).cyan()
        );
    }

    let ratio = if report.imbalance_ratio.is_finite() {
        format!("{:.2}:1", report.imbalance_ratio)
    } else {
        "single class".to_string()
    };
    let severity = match report.severity {
        ImbalanceSeverity::Mild => style(report.severity.to_string()).green(),
        ImbalanceSeverity::Moderate => style(report.severity.to_string()).yellow(),
        ImbalanceSeverity::High | ImbalanceSeverity::Severe => {
            style(report.severity.to_string()).red()
        }
    };

    println!("\n  Imbalance ratio: {} ({})", ratio, severity);
    println!(
        "  Majority baseline: {:.1}% by always predicting {}",
        report.majority_baseline_accuracy, report.majority
    );
    println!("  {}", style(report.severity.advice()).dim());
    Ok(())
}
