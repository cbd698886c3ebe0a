//! Synthetic satellite telemetry
//!
//! Produces a table of normally distributed voltage, signal strength and apogee
//! readings at one-second intervals, with a fraction of rows whose voltage has
//! been scaled up to act as ground-truth anomalies.

use crate::dataset::FeatureRow;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Mean and standard deviation of one generated channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub mean: f64,
    pub std_dev: f64,
}

impl Channel {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }

    fn distribution(&self, name: &str) -> Result<Normal<f64>> {
        Normal::new(self.mean, self.std_dev)
            .with_context(|| format!("invalid {} distribution ({:?})", name, self))
    }
}

/// Settings for the telemetry generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub rows: usize,
    /// Fraction of rows turned into voltage anomalies
    pub anomaly_rate: f64,
    /// Factor applied to the voltage of anomalous rows
    pub anomaly_scale: f64,
    pub voltage: Channel,
    pub signal_strength: Channel,
    pub apogee: Channel,
    /// First timestamp, `YYYY-MM-DDTHH:MM:SS`
    pub start: String,
    pub interval_secs: i64,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rows: 1000,
            anomaly_rate: 0.05,
            anomaly_scale: 1.5,
            voltage: Channel::new(28.0, 2.0),
            signal_strength: Channel::new(100.0, 10.0),
            apogee: Channel::new(500.0, 50.0),
            start: "2025-06-30T00:00:00".to_string(),
            interval_secs: 1,
            seed: None,
        }
    }
}

/// Generated rows plus the positions of the injected anomalies
#[derive(Debug, Clone)]
pub struct GeneratedTelemetry {
    pub rows: Vec<FeatureRow>,
    /// Sorted indices of rows whose voltage was scaled
    pub anomaly_indices: Vec<usize>,
}

impl GeneratedTelemetry {
    pub fn is_injected(&self, index: usize) -> bool {
        self.anomaly_indices.binary_search(&index).is_ok()
    }
}

/// Generate a telemetry table
pub fn generate(config: &GeneratorConfig) -> Result<GeneratedTelemetry> {
    if !(0.0..=1.0).contains(&config.anomaly_rate) {
        anyhow::bail!(
            "anomaly_rate must be in [0, 1], got {}",
            config.anomaly_rate
        );
    }

    let start = NaiveDateTime::parse_from_str(&config.start, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid start timestamp '{}'", config.start))?;
    let voltage = config.voltage.distribution("voltage")?;
    let signal = config.signal_strength.distribution("signal_strength")?;
    let apogee = config.apogee.distribution("apogee")?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut rows: Vec<FeatureRow> = (0..config.rows)
        .map(|i| {
            let ts = start + chrono::Duration::seconds(i as i64 * config.interval_secs);
            FeatureRow::new(
                voltage.sample(&mut rng),
                signal.sample(&mut rng),
                apogee.sample(&mut rng),
            )
            .with_timestamp(ts.format(TIMESTAMP_FORMAT).to_string())
        })
        .collect();

    let anomaly_count = (config.rows as f64 * config.anomaly_rate) as usize;
    let mut anomaly_indices = index::sample(&mut rng, config.rows, anomaly_count).into_vec();
    anomaly_indices.sort_unstable();
    for &i in &anomaly_indices {
        rows[i].voltage *= config.anomaly_scale;
    }

    tracing::debug!(
        "Generated {} telemetry rows with {} injected anomalies",
        rows.len(),
        anomaly_indices.len()
    );

    Ok(GeneratedTelemetry {
        rows,
        anomaly_indices,
    })
}
