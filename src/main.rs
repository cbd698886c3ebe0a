use anyhow::{Context, Result};
use clap::Parser;
use satwatch::cli::{Cli, Command, DetectArgs, GenerateArgs, OutputFormat};
use satwatch::config::DetectorConfig;
use satwatch::csv_output::CsvOutput;
use satwatch::detector::{AnomalyDetector, ScoredRow};
use satwatch::generator::{self, GeneratorConfig};
use satwatch::io::{self, LoadedRecords};
use satwatch::json_output::{JsonModelSummary, JsonTelemetryReport};
use std::fmt::{self, Write as _};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let config = GeneratorConfig {
        rows: args.rows,
        anomaly_rate: args.anomaly_rate,
        seed: args.seed,
        ..GeneratorConfig::default()
    };
    let telemetry = generator::generate(&config)?;
    let csv = CsvOutput::from_rows(&telemetry.rows).to_csv()?;
    io::write_output(args.output.as_deref(), &csv)
}

/// Human-readable detection summary
fn render_text(
    rows: &[ScoredRow],
    summary: &JsonModelSummary,
    anomalies_only: bool,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    write_summary(&mut out, rows, summary)?;
    write_table(&mut out, rows, anomalies_only)?;
    Ok(out)
}

fn write_summary(out: &mut String, rows: &[ScoredRow], summary: &JsonModelSummary) -> fmt::Result {
    let flagged = rows.iter().filter(|r| r.is_anomaly).count();

    writeln!(out, "=== Isolation Forest Anomaly Detection ===")?;
    writeln!(
        out,
        "Rows: {}  Trees: {}  Sample size: {}  Contamination: {}",
        rows.len(),
        summary.tree_count,
        summary.sample_size,
        summary.contamination
    )?;
    writeln!(out, "Threshold: {:.4}", summary.threshold)?;
    writeln!(out, "Anomalies: {}", flagged)?;
    writeln!(out)
}

fn write_table(out: &mut String, rows: &[ScoredRow], anomalies_only: bool) -> fmt::Result {
    writeln!(
        out,
        "{:<20} {:>10} {:>10} {:>10} {:>8} {}",
        "timestamp", "voltage", "signal", "apogee", "score", "anomaly"
    )?;
    writeln!(out, "─────────────────────────────────────────────────────────────────────")?;

    for row in rows.iter().filter(|r| !anomalies_only || r.is_anomaly) {
        writeln!(
            out,
            "{:<20} {:>10.3} {:>10.3} {:>10.3} {:>8.4} {}",
            row.row.timestamp.as_deref().unwrap_or("-"),
            row.row.voltage,
            row.row.signal_strength,
            row.row.apogee,
            row.anomaly_score,
            if row.is_anomaly { "*" } else { "" }
        )?;
    }
    Ok(())
}

fn run_detect(args: DetectArgs) -> Result<()> {
    let base = match &args.config {
        Some(path) => DetectorConfig::from_toml_file(path)?,
        None => DetectorConfig::default(),
    };
    let config = args.apply_overrides(base);
    let mut detector = AnomalyDetector::new(config)?;

    let records = io::load_records(&args.input)?;
    let labeled = match &records {
        LoadedRecords::Csv(rows) => detector.fit(rows),
        LoadedRecords::Json(rows) => detector.fit(rows),
    }
    .with_context(|| format!("Failed to fit detector on {}", args.input.display()))?;

    let config = detector.config();
    let summary = JsonModelSummary {
        tree_count: config.tree_count,
        sample_size: config.sample_size,
        contamination: config.contamination,
        threshold: detector.threshold().unwrap_or(f64::NAN),
    };

    let rendered = match args.format {
        OutputFormat::Text => render_text(&labeled, &summary, args.anomalies_only)?,
        OutputFormat::Csv => {
            let rows: Vec<ScoredRow> = labeled
                .into_iter()
                .filter(|r| !args.anomalies_only || r.is_anomaly)
                .collect();
            CsvOutput::from_scored(&rows).to_csv()?
        }
        OutputFormat::Json => {
            let mut json = JsonTelemetryReport::from_scored(&labeled)
                .with_model(summary)
                .to_json()?;
            json.push('\n');
            json
        }
    };

    io::write_output(args.output.as_deref(), &rendered)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match args.command {
        Command::Generate(generate) => run_generate(generate),
        Command::Detect(detect) => run_detect(detect),
    }
}
