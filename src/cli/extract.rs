//! Extract command - build the labeled feature table from the raw records

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use afib_detect::config::PipelineConfig;
use afib_detect::dataset::{BuildStats, DatasetBuilder, FailedRecord};
use afib_detect::models::Label;
use afib_detect::record::{DataLayout, WfdbSource};

#[derive(Serialize)]
struct ExtractSummary<'a> {
    output: &'a PathBuf,
    discovered: usize,
    missing_dirs: &'a [PathBuf],
    stats: &'a BuildStats,
    failures: &'a [FailedRecord],
}

pub fn run(
    config: PipelineConfig,
    data_root: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let layout = data_root
        .map(DataLayout::new)
        .unwrap_or_else(|| config.layout());
    let output = output.unwrap_or(config.paths.dataset);

    let discovery = layout.discover();
    if discovery.records.is_empty() {
        anyhow::bail!(
            "No records found under {}. Run `afib-detect doctor` to check the layout.",
            layout.root().display()
        );
    }

    if !json {
        println!(
            "\n{} Extracting features from {} records ({} FA, {} Normal)\n",
            style("🫀").bold(),
            style(discovery.records.len()).cyan(),
            discovery.count(Label::Fa),
            discovery.count(Label::Normal)
        );
    }

    let bar = if json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(discovery.records.len() as u64)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓▒░  "),
    );
    bar.set_message("records");

    let source = WfdbSource::new();
    let report =
        DatasetBuilder::new(&source).build_with_progress(&discovery.records, || bar.inc(1));
    bar.finish_and_clear();

    if report.dataset.is_empty() {
        anyhow::bail!(
            "No features could be extracted ({} records failed)",
            report.failed()
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    report
        .dataset
        .write_csv(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if json {
        let summary = ExtractSummary {
            output: &output,
            discovered: discovery.records.len(),
            missing_dirs: &discovery.missing_dirs,
            stats: &report.stats,
            failures: &report.failures,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} Extracted {} of {} records",
        style("✓").green(),
        report.extracted(),
        discovery.records.len()
    );
    for (class, counts) in &report.stats.by_class {
        println!(
            "  {:<8} {:>5} extracted  {:>4} failed",
            class, counts.extracted, counts.failed
        );
    }
    for (dataset, counts) in &report.stats.by_dataset {
        println!(
            "  {:<8} {:>5} extracted  {:>4} failed",
            dataset, counts.extracted, counts.failed
        );
    }

    if !report.failures.is_empty() {
        println!("\n{} Skipped records:", style("⚠").yellow());
        for failure in report.failures.iter().take(10) {
            println!(
                "  {}/{} [{}] {}",
                failure.dataset,
                failure.record_name,
                failure.kind,
                style(&failure.message).dim()
            );
        }
        if report.failures.len() > 10 {
            println!("  ... and {} more", report.failures.len() - 10);
        }
    }
    for dir in &discovery.missing_dirs {
        println!("{} Folder not found: {}", style("○").dim(), dir.display());
    }

    println!(
        "\n{} Dataset written to {}",
        style("✓").green(),
        style(output.display()).cyan()
    );
    Ok(())
}
