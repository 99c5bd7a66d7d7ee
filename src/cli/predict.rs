//! Predict command - classify one record with the persisted model

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use afib_detect::classifier::ArtifactPaths;
use afib_detect::config::PipelineConfig;
use afib_detect::features::{extract_from_record, RhythmRegularity};
use afib_detect::models::{AnnotationSuffix, Label, RecordRef};
use afib_detect::record::{RecordSource, WfdbSource};
use afib_detect::scoring::{ScoredRecord, ScoringEngine};

use super::pct;

/// What to print besides the label
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub show_proba: bool,
    pub verbose: bool,
    pub json: bool,
}

pub fn run(
    config: PipelineConfig,
    record: &Path,
    annotation_suffix: AnnotationSuffix,
    options: OutputOptions,
    models_dir: Option<PathBuf>,
) -> Result<()> {
    let reference = RecordRef::from_path(record, annotation_suffix);

    // Record problems are reported before a missing model
    let record = WfdbSource::new()
        .load(&reference)
        .with_context(|| format!("Failed to read record {}", reference.base_path.display()))?;
    let features = extract_from_record(&record)
        .with_context(|| format!("Failed to extract features from {}", reference.record_name))?;

    let artifacts = ArtifactPaths::new(models_dir.unwrap_or(config.paths.models_dir));
    let engine = ScoringEngine::load(&artifacts).context("Failed to load model")?;
    let scored = engine.score_features(&record.record_id, features);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&scored)?);
        return Ok(());
    }

    print_prediction(&scored, options);
    Ok(())
}

fn print_prediction(scored: &ScoredRecord, options: OutputOptions) {
    let label = match scored.predicted_label {
        Label::Fa => style(scored.predicted_label.to_string()).red().bold(),
        Label::Normal => style(scored.predicted_label.to_string()).green().bold(),
    };

    println!("\nRecord:     {}", style(&scored.record_id).cyan());
    println!(
        "Prediction: {} ({})",
        label,
        scored.predicted_label.class_name()
    );
    println!("Confidence: {}", pct(scored.confidence));

    if options.show_proba {
        println!("\nProbabilities:");
        println!("  Normal: {}", pct(scored.probability_normal));
        println!("  FA:     {}", pct(scored.probability_fa));
    }

    if options.verbose {
        println!("\nFeatures:");
        for (name, value) in scored.features.named_values() {
            println!("  {:<18} {:>12.4}", name, value);
        }

        let hint = match scored.regularity {
            RhythmRegularity::Regular => style(scored.regularity.describe()).green(),
            RhythmRegularity::Borderline => style(scored.regularity.describe()).yellow(),
            RhythmRegularity::Irregular => style(scored.regularity.describe()).red(),
        };
        println!(
            "\nR-R variability: CV {:.1}% ({})",
            scored.features.rr_cv, hint
        );
    }
}
