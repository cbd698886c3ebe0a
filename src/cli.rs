//! CLI argument parsing for satwatch

use crate::config::{DetectorConfig, SamplingPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for detection results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// JSON report with normal/anomalous points and channel statistics
    Json,
    /// CSV table with anomaly and anomaly_score columns appended
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "satwatch")]
#[command(version)]
#[command(about = "Unsupervised anomaly detection for satellite telemetry", long_about = None)]
pub struct Cli {
    /// Enable debug tracing on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a synthetic telemetry table
    Generate(GenerateArgs),
    /// Fit an Isolation Forest on a telemetry table and label anomalies
    Detect(DetectArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Number of rows to generate
    #[arg(long, default_value = "1000")]
    pub rows: usize,

    /// Fraction of rows whose voltage is scaled to create anomalies
    #[arg(long = "anomaly-rate", value_name = "RATE", default_value = "0.05")]
    pub anomaly_rate: f64,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Telemetry table (.csv or .json)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Detector configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of isolation trees
    #[arg(long = "trees", value_name = "N")]
    pub tree_count: Option<usize>,

    /// Rows sampled per tree
    #[arg(long = "sample-size", value_name = "N")]
    pub sample_size: Option<usize>,

    /// Expected anomaly fraction, in (0, 0.5)
    #[arg(long, value_name = "RATE")]
    pub contamination: Option<f64>,

    /// Seed for a reproducible forest
    #[arg(long)]
    pub seed: Option<u64>,

    /// Policy when the sample size does not fit inside the input
    #[arg(long, value_enum, value_name = "POLICY")]
    pub sampling: Option<SamplingPolicy>,

    /// Build trees on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Only emit rows labeled anomalous (text and csv formats)
    #[arg(long = "anomalies-only")]
    pub anomalies_only: bool,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl DetectArgs {
    /// Apply command-line overrides on top of a base configuration
    pub fn apply_overrides(&self, mut config: DetectorConfig) -> DetectorConfig {
        if let Some(n) = self.tree_count {
            config.tree_count = n;
        }
        if let Some(n) = self.sample_size {
            config.sample_size = n;
        }
        if let Some(r) = self.contamination {
            config.contamination = r;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(policy) = self.sampling {
            config.sampling = policy;
        }
        if self.sequential {
            config.parallel = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(args: &[&str]) -> DetectArgs {
        let mut argv = vec!["satwatch", "detect"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Command::Detect(args) => args,
            other => panic!("expected detect, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_detect_input() {
        let args = detect(&["telemetry.csv"]);
        assert_eq!(args.input, PathBuf::from("telemetry.csv"));
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.anomalies_only);
        assert!(args.tree_count.is_none());
    }

    #[test]
    fn test_cli_detect_requires_input() {
        assert!(Cli::try_parse_from(["satwatch", "detect"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["satwatch"]).is_err());
    }

    #[test]
    fn test_cli_generate_defaults() {
        let cli = Cli::parse_from(["satwatch", "generate"]);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.rows, 1000);
                assert_eq!(args.anomaly_rate, 0.05);
                assert!(args.seed.is_none());
                assert!(args.output.is_none());
            }
            other => panic!("expected generate, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_debug_flag_is_global() {
        let cli = Cli::parse_from(["satwatch", "detect", "in.csv", "--debug"]);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_format_and_sampling() {
        let args = detect(&["in.csv", "--format", "json", "--sampling", "with-replacement"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.sampling, Some(SamplingPolicy::WithReplacement));
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let args = detect(&[
            "in.csv",
            "--trees",
            "10",
            "--sample-size",
            "32",
            "--contamination",
            "0.1",
            "--seed",
            "42",
            "--sequential",
        ]);
        let config = args.apply_overrides(DetectorConfig::default());
        assert_eq!(config.tree_count, 10);
        assert_eq!(config.sample_size, 32);
        assert_eq!(config.contamination, 0.1);
        assert_eq!(config.seed, Some(42));
        assert!(!config.parallel);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let base = DetectorConfig::default().with_seed(5);
        let config = detect(&["in.csv"]).apply_overrides(base.clone());
        assert_eq!(config, base);
    }
}
