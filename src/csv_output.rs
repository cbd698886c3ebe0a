//! CSV output for telemetry tables
//!
//! Writes raw generated telemetry or scored rows using the column order
//! `timestamp,voltage,signal_strength,apogee[,anomaly,anomaly_score]`.
//! Floats use Rust's shortest round-trip formatting so values read back
//! bit-for-bit.

use crate::dataset::FeatureRow;
use crate::detector::ScoredRow;
use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};

/// CSV record for a single telemetry row
#[derive(Debug, Clone)]
pub struct CsvTelemetryRow {
    pub row: FeatureRow,
    /// `(is_anomaly, anomaly_score)` when the row has been scored
    pub label: Option<(bool, f64)>,
}

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput {
    rows: Vec<CsvTelemetryRow>,
    include_labels: bool,
}

impl CsvOutput {
    /// Create a new CSV output formatter
    pub fn new(include_labels: bool) -> Self {
        Self {
            rows: Vec::new(),
            include_labels,
        }
    }

    /// Formatter pre-filled with scored rows
    pub fn from_scored(rows: &[ScoredRow]) -> Self {
        let mut out = Self::new(true);
        for row in rows {
            out.add_scored(row.clone());
        }
        out
    }

    /// Formatter pre-filled with unscored rows
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut out = Self::new(false);
        for row in rows {
            out.add_row(row.clone());
        }
        out
    }

    pub fn add_row(&mut self, row: FeatureRow) {
        self.rows.push(CsvTelemetryRow { row, label: None });
    }

    pub fn add_scored(&mut self, scored: ScoredRow) {
        self.rows.push(CsvTelemetryRow {
            row: scored.row,
            label: Some((scored.is_anomaly, scored.anomaly_score)),
        });
    }

    /// CSV header record based on enabled flags
    fn header(&self) -> Vec<&'static str> {
        let mut headers = vec!["timestamp", "voltage", "signal_strength", "apogee"];

        if self.include_labels {
            headers.push("anomaly");
            headers.push("anomaly_score");
        }

        headers
    }

    fn format_row(&self, entry: &CsvTelemetryRow) -> Vec<String> {
        let row = &entry.row;
        let mut fields = vec![
            row.timestamp.clone().unwrap_or_default(),
            row.voltage.to_string(),
            row.signal_strength.to_string(),
            row.apogee.to_string(),
        ];

        if self.include_labels {
            match entry.label {
                Some((is_anomaly, score)) => {
                    fields.push(is_anomaly.to_string());
                    fields.push(score.to_string());
                }
                None => {
                    fields.push(String::new());
                    fields.push(String::new());
                }
            }
        }

        fields
    }

    /// Generate CSV output as string
    ///
    /// Quoting is left to the `csv` writer, so any identifier (commas,
    /// quotes, CR or LF) reads back unchanged through [`crate::io::read_csv`].
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(self.header())?;
        for row in &self.rows {
            writer.write_record(self.format_row(row))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }
}
