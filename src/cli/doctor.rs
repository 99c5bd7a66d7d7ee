//! Doctor command - check config, data layout and artifacts

use std::path::Path;

use anyhow::Result;
use console::style;

use afib_detect::config::{PipelineConfig, PROJECT_CONFIG_FILE};

pub fn run(config: &PipelineConfig, explicit_config: Option<&Path>) -> Result<()> {
    println!("🩺 afib-detect Doctor\n");
    let mut problems = 0usize;

    // Config source
    match explicit_config {
        Some(path) => println!("✓ Config: {}", path.display()),
        None if Path::new(PROJECT_CONFIG_FILE).exists() => {
            println!("✓ Config: ./{}", PROJECT_CONFIG_FILE)
        }
        None => match PipelineConfig::user_config_path().filter(|p| p.exists()) {
            Some(path) => println!("✓ Config: {}", path.display()),
            None => {
                println!("○ Config: none found, using defaults");
                println!("  Run `afib-detect init` to write one");
            }
        },
    }

    // Raw data folders
    let layout = config.layout();
    println!("\nData root: {}", style(layout.root().display()).cyan());
    for check in layout.check_structure() {
        if !check.exists {
            problems += 1;
            println!("✗ {}: folder not found", check.path.display());
        } else if check.incomplete.is_empty() {
            println!("✓ {}: {} records", check.path.display(), check.headers);
        } else {
            problems += 1;
            println!(
                "○ {}: {} records, {} missing .dat or annotation files",
                check.path.display(),
                check.headers,
                check.incomplete.len()
            );
            for name in check.incomplete.iter().take(5) {
                println!("    {}", name);
            }
            if check.incomplete.len() > 5 {
                println!("    ... and {} more", check.incomplete.len() - 5);
            }
        }
    }

    // Feature table
    println!();
    if config.paths.dataset.exists() {
        println!("✓ Dataset: {}", config.paths.dataset.display());
    } else {
        println!("○ Dataset: {} not built yet", config.paths.dataset.display());
        println!("  Run `afib-detect extract`");
    }

    // Model artifacts
    let artifacts = config.artifacts();
    let missing = artifacts.missing();
    if missing.is_empty() {
        match artifacts.load_report() {
            Ok(report) => println!(
                "✓ Model: {} trained {}",
                report.selected,
                report.trained_at.format("%Y-%m-%d %H:%M UTC")
            ),
            Err(_) => println!("✓ Model: {}", artifacts.dir.display()),
        }
    } else {
        for path in &missing {
            println!("○ Model: {} missing", path.display());
        }
        println!("  Run `afib-detect train`");
    }

    if problems == 0 {
        println!("\n✅ All checks passed!");
    } else {
        println!(
            "\n{} {} data problem(s) found",
            style("⚠").yellow(),
            problems
        );
    }
    Ok(())
}
