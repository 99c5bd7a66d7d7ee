//! Evaluate command - re-score a balanced sample of dataset records

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use afib_detect::config::PipelineConfig;
use afib_detect::dataset::Dataset;
use afib_detect::evaluate::{BatchEvaluator, EvaluationReport, Verdict};
use afib_detect::models::RecordRef;
use afib_detect::record::WfdbSource;
use afib_detect::scoring::ScoringEngine;

use super::pct;

pub fn run(
    config: PipelineConfig,
    samples: Option<usize>,
    seed: Option<u64>,
    dataset: Option<PathBuf>,
    verbose: bool,
    json: bool,
) -> Result<()> {
    let mut eval_config = config.evaluation.clone();
    if let Some(n) = samples {
        eval_config.sample_size = n;
    }
    if let Some(seed) = seed {
        eval_config.seed = seed;
    }
    if eval_config.sample_size < 2 {
        anyhow::bail!("Sample size must be at least 2 (one record per class)");
    }

    let dataset_path = dataset.unwrap_or_else(|| config.paths.dataset.clone());
    let table = Dataset::read_csv(&dataset_path)
        .with_context(|| format!("Failed to read dataset {}", dataset_path.display()))?;

    // Rows only carry provenance; rebuild the on-disk reference for each
    let layout = config.layout();
    let pool: Vec<RecordRef> = table
        .rows()
        .iter()
        .filter_map(|row| {
            let reference = layout.record_ref(&row.dataset, &row.subset, &row.record_name);
            if reference.is_none() {
                tracing::warn!(
                    "Skipping {}: unknown dataset '{}'",
                    row.record_name,
                    row.dataset
                );
            }
            reference
        })
        .collect();

    let engine = ScoringEngine::load(&config.artifacts())
        .context("Failed to load model")?;
    let source = WfdbSource::new();
    let report = BatchEvaluator::new(&engine, &source).evaluate(&pool, &eval_config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "\n{} Evaluating {} ({} records, seed {})\n",
        style("🔬").bold(),
        style(engine.model_kind().display_name()).cyan(),
        report.total,
        eval_config.seed
    );

    if verbose {
        print_results(&report);
    }
    print_summary(&report);
    Ok(())
}

fn print_results(report: &EvaluationReport) {
    for r in &report.results {
        match &r.verdict {
            Verdict::Scored(s) => {
                let mark = if r.is_correct() {
                    style("✓").green()
                } else {
                    style("✗").red()
                };
                println!(
                    "  {} {:<12} actual {:<6} predicted {:<6} ({})",
                    mark,
                    r.record_name,
                    r.actual.to_string(),
                    s.predicted_label.to_string(),
                    pct(s.confidence)
                );
            }
            Verdict::Error { kind, .. } => println!(
                "  {} {:<12} actual {:<6} error: {}",
                style("!").yellow(),
                r.record_name,
                r.actual.to_string(),
                kind
            ),
        }
    }
    println!();
}

fn print_summary(report: &EvaluationReport) {
    let accuracy = pct(report.accuracy);
    let accuracy = if report.accuracy >= 0.9 {
        style(accuracy).green()
    } else if report.accuracy >= 0.7 {
        style(accuracy).yellow()
    } else {
        style(accuracy).red()
    };
    println!(
        "Accuracy: {} ({}/{})",
        accuracy, report.correct, report.total
    );
    for class in &report.per_class {
        println!(
            "  {:<7} {} ({}/{})",
            class.label.to_string(),
            pct(class.accuracy),
            class.correct,
            class.total
        );
    }

    if let Some(c) = report.mean_confidence_correct {
        println!("\nMean confidence, correct:   {}", pct(c));
    }
    if let Some(c) = report.mean_confidence_incorrect {
        println!("Mean confidence, incorrect: {}", pct(c));
    }

    if !report.misclassified.is_empty() {
        println!("\n{} Misclassified:", style("⚠").yellow());
        for m in &report.misclassified {
            println!(
                "  {:<12} actual {:<6} predicted {:<6} ({}, CV {:.1}%)",
                m.record_name,
                m.actual.to_string(),
                m.predicted.to_string(),
                pct(m.confidence),
                m.rr_cv
            );
        }
    }

    if !report.errors.is_empty() {
        println!("\n{} Could not score:", style("⚠").yellow());
        for e in &report.errors {
            println!("  {:<12} [{}] {}", e.record_name, e.kind, style(&e.message).dim());
        }
    }
}
