//! CLI command definitions and handlers

mod balance;
mod doctor;
mod evaluate;
mod extract;
mod init;
mod predict;
mod train;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use afib_detect::config::PipelineConfig;
use afib_detect::error::EcgError;
use afib_detect::models::AnnotationSuffix;

/// afib-detect - atrial fibrillation screening from R-R intervals
#[derive(Parser, Debug)]
#[command(name = "afib-detect")]
#[command(
    version,
    about = "Classify annotated ECG records as atrial fibrillation or normal sinus rhythm from R-R interval statistics",
    after_help = "\
Examples:
  afib-detect init                                 Write an example afib.toml
  afib-detect extract                              Build the feature table from data/raw
  afib-detect train                                Train candidates and keep the best
  afib-detect predict data/raw/nsrdb/16265 --annotation-suffix atr
  afib-detect evaluate --samples 40 --verbose      Re-score a balanced sample"
)]
pub struct Cli {
    /// Config file (default: ./afib.toml, then the user config)
    #[arg(long, short = 'c', global = true, env = "AFIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an example afib.toml config file
    Init {
        /// Where to write it (default: ./afib.toml)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Check config, data layout and model artifacts
    Doctor,

    /// Extract R-R features from every discovered record into the dataset table
    Extract {
        /// Root holding aftdb/ and nsrdb/ (overrides config)
        #[arg(long)]
        data_root: Option<PathBuf>,

        /// Output CSV (overrides config)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the class balance of the dataset table
    Balance {
        /// Dataset CSV (overrides config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Train every candidate model and persist the best one
    Train {
        /// Dataset CSV (overrides config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Output directory for artifacts (overrides config)
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Split and model seed
        #[arg(long)]
        seed: Option<u64>,

        /// Fraction of each class held out for testing
        #[arg(long)]
        test_ratio: Option<f64>,

        /// Print the training report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a single record
    #[command(after_help = "\
Exit status:
  0  prediction made
  1  unexpected error (including missing model artifacts)
  2  record not found, unreadable or malformed
  3  not enough beat annotations")]
    Predict {
        /// Record path, with or without .hea/.dat extension
        record: PathBuf,

        /// Annotation file suffix to read beats from
        #[arg(long, short = 'a', value_enum, default_value_t = AnnotationSuffix::Qrs)]
        annotation_suffix: AnnotationSuffix,

        /// Show both class probabilities
        #[arg(long)]
        show_proba: bool,

        /// Show the extracted features and a rhythm hint
        #[arg(long, short = 'v')]
        verbose: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Artifact directory (overrides config)
        #[arg(long)]
        models_dir: Option<PathBuf>,
    },

    /// Re-score a class-balanced sample of dataset records end to end
    Evaluate {
        /// Sample size; half drawn from each class
        #[arg(long, short = 'n')]
        samples: Option<usize>,

        /// Sampling seed
        #[arg(long)]
        seed: Option<u64>,

        /// Dataset CSV (overrides config)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Print every evaluated record
        #[arg(long, short = 'v')]
        verbose: bool,

        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { path } = &cli.command {
        return init::run(path.as_deref().or(cli.config.as_deref()));
    }

    let config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Doctor => doctor::run(&config, cli.config.as_deref()),
        Commands::Extract {
            data_root,
            output,
            json,
        } => extract::run(config, data_root, output, json),
        Commands::Balance { dataset, json } => balance::run(&config, dataset, json),
        Commands::Train {
            dataset,
            models_dir,
            seed,
            test_ratio,
            json,
        } => train::run(config, train::Overrides {
            dataset,
            models_dir,
            seed,
            test_ratio,
        }, json),
        Commands::Predict {
            record,
            annotation_suffix,
            show_proba,
            verbose,
            json,
            models_dir,
        } => predict::run(
            config,
            &record,
            annotation_suffix,
            predict::OutputOptions {
                show_proba,
                verbose,
                json,
            },
            models_dir,
        ),
        Commands::Evaluate {
            samples,
            seed,
            dataset,
            verbose,
            json,
        } => evaluate::run(config, samples, seed, dataset, verbose, json),
    }
}

/// Exit status for a failed command.
///
/// 2 when a record cannot be found or read, or its header or beat annotations
/// are malformed. 3 when there is not enough data (too few beats or training
/// records). 1 for anything else.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    let ecg = err.chain().find_map(|e| e.downcast_ref::<EcgError>());
    match ecg {
        Some(EcgError::RecordUnreadable { .. })
        | Some(EcgError::NonMonotonicBeats { .. })
        | Some(EcgError::InvalidSamplingFrequency { .. }) => 2,
        Some(EcgError::InsufficientBeats { .. })
        | Some(EcgError::EmptyIntervalSequence { .. })
        | Some(EcgError::InsufficientTrainingData(_)) => 3,
        _ => 1,
    }
}

/// Format a fraction in [0, 1] as a percentage
pub(crate) fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_predict_defaults() {
        let cli = Cli::try_parse_from(["afib-detect", "predict", "data/raw/nsrdb/16265"]).unwrap();
        match cli.command {
            Commands::Predict {
                annotation_suffix,
                show_proba,
                ..
            } => {
                assert_eq!(annotation_suffix, AnnotationSuffix::Qrs);
                assert!(!show_proba);
            }
            other => panic!("expected predict, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_suffix() {
        assert!(Cli::try_parse_from(["afib-detect", "predict", "r", "-a", "ecg"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let unreadable = anyhow::Error::new(EcgError::RecordUnreadable {
            record_id: "x".into(),
            path: PathBuf::from("x.hea"),
            reason: "missing".into(),
        })
        .context("Failed to score x");
        assert_eq!(exit_code_for(&unreadable), 2);

        let duplicate_beat = anyhow::Error::new(EcgError::NonMonotonicBeats {
            record_id: "x".into(),
            index: 2,
        })
        .context("Failed to extract features from x");
        assert_eq!(exit_code_for(&duplicate_beat), 2);

        let bad_fs = anyhow::Error::new(EcgError::InvalidSamplingFrequency {
            record_id: "x".into(),
            value: 0.0,
        });
        assert_eq!(exit_code_for(&bad_fs), 2);

        let short = anyhow::Error::new(EcgError::InsufficientBeats {
            record_id: "x".into(),
            found: 1,
        });
        assert_eq!(exit_code_for(&short), 3);

        let missing = anyhow::Error::new(EcgError::ModelArtifactMissing {
            path: PathBuf::from("models/scaler.json"),
        });
        assert_eq!(exit_code_for(&missing), 1);
        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_pct() {
        assert_eq!(pct(0.9734), "97.3%");
    }
}
