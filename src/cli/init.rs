//! Init command - write an example config file

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use afib_detect::config::{PipelineConfig, PROJECT_CONFIG_FILE};

/// Run the init command
pub fn run(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(Path::new(PROJECT_CONFIG_FILE));

    println!("\n{} Initializing afib-detect\n", style("🫀").bold());

    let written = PipelineConfig::write_example(config_path)
        .with_context(|| format!("Failed to create {}", config_path.display()))?;
    if written {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }

    println!("\nNext steps:");
    println!(
        "  {} Check the data layout",
        style("afib-detect doctor").cyan()
    );
    println!(
        "  {} Build the feature table",
        style("afib-detect extract").cyan()
    );
    println!("  {} Train and select a model", style("afib-detect train").cyan());
    println!(
        "  {} Classify a record",
        style("afib-detect predict <record>").cyan()
    );

    Ok(())
}
