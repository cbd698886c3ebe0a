//! JSON report for labeled telemetry
//!
//! Splits rows into `normal` and `anomalies`, each point carrying its score,
//! and adds per-channel summary statistics over the whole table.

use crate::dataset::RowFault;
use crate::detector::ScoredRow;
use serde::{Deserialize, Serialize};

/// A telemetry point in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonTelemetryPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub voltage: f64,
    pub signal_strength: f64,
    pub apogee: f64,
    /// Anomaly score (0.0 to 1.0, higher is more anomalous)
    pub anomaly_score: f64,
}

impl From<&ScoredRow> for JsonTelemetryPoint {
    fn from(scored: &ScoredRow) -> Self {
        Self {
            timestamp: scored.row.timestamp.clone(),
            voltage: scored.row.voltage,
            signal_strength: scored.row.signal_strength,
            apogee: scored.row.apogee,
            anomaly_score: scored.anomaly_score,
        }
    }
}

/// Mean and sample standard deviation of each channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonTelemetryStats {
    pub voltage_mean: f64,
    pub voltage_std: f64,
    pub signal_strength_mean: f64,
    pub signal_strength_std: f64,
    pub apogee_mean: f64,
    pub apogee_std: f64,
}

/// Model settings the labels were produced with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonModelSummary {
    pub tree_count: usize,
    pub sample_size: usize,
    pub contamination: f64,
    pub threshold: f64,
}

/// A row that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRowFault {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub error: String,
}

impl From<&RowFault> for JsonRowFault {
    fn from(fault: &RowFault) -> Self {
        Self {
            row: fault.row,
            timestamp: fault.id.clone(),
            error: fault.error.to_string(),
        }
    }
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTelemetryReport {
    pub normal: Vec<JsonTelemetryPoint>,
    pub anomalies: Vec<JsonTelemetryPoint>,
    pub stats: JsonTelemetryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<JsonModelSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<JsonRowFault>,
}

impl JsonTelemetryReport {
    /// Build the report from labeled rows
    pub fn from_scored(rows: &[ScoredRow]) -> Self {
        let (anomalies, normal): (Vec<&ScoredRow>, Vec<&ScoredRow>) =
            rows.iter().partition(|r| r.is_anomaly);

        let voltage: Vec<f64> = rows.iter().map(|r| r.row.voltage).collect();
        let signal: Vec<f64> = rows.iter().map(|r| r.row.signal_strength).collect();
        let apogee: Vec<f64> = rows.iter().map(|r| r.row.apogee).collect();

        Self {
            normal: normal.into_iter().map(JsonTelemetryPoint::from).collect(),
            anomalies: anomalies.into_iter().map(JsonTelemetryPoint::from).collect(),
            stats: JsonTelemetryStats {
                voltage_mean: mean(&voltage),
                voltage_std: sample_std(&voltage),
                signal_strength_mean: mean(&signal),
                signal_strength_std: sample_std(&signal),
                apogee_mean: mean(&apogee),
                apogee_std: sample_std(&apogee),
            },
            model: None,
            faults: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: JsonModelSummary) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_faults(mut self, faults: &[RowFault]) -> Self {
        self.faults = faults.iter().map(JsonRowFault::from).collect();
        self
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with Bessel's correction (n − 1)
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FeatureRow;
    use crate::error::DetectorError;

    fn scored(ts: &str, voltage: f64, score: f64, is_anomaly: bool) -> ScoredRow {
        ScoredRow {
            row: FeatureRow::new(voltage, 100.0, 500.0).with_timestamp(ts),
            anomaly_score: score,
            is_anomaly,
        }
    }

    #[test]
    fn test_report_splits_normal_and_anomalies() {
        let rows = vec![
            scored("t0", 28.0, 0.45, false),
            scored("t1", 42.0, 0.71, true),
            scored("t2", 30.0, 0.48, false),
        ];
        let report = JsonTelemetryReport::from_scored(&rows);

        assert_eq!(report.normal.len(), 2);
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].timestamp.as_deref(), Some("t1"));
        assert_eq!(report.normal[1].voltage, 30.0);
    }

    #[test]
    fn test_stats_use_sample_std() {
        let rows = vec![
            scored("a", 2.0, 0.5, false),
            scored("b", 4.0, 0.5, false),
            scored("c", 6.0, 0.5, false),
        ];
        let stats = JsonTelemetryReport::from_scored(&rows).stats;
        assert_eq!(stats.voltage_mean, 4.0);
        assert_eq!(stats.voltage_std, 2.0);
        assert_eq!(stats.signal_strength_std, 0.0);
        assert_eq!(stats.apogee_mean, 500.0);
    }

    #[test]
    fn test_empty_report() {
        let report = JsonTelemetryReport::from_scored(&[]);
        assert!(report.normal.is_empty());
        assert_eq!(report.stats, JsonTelemetryStats::default());
    }

    #[test]
    fn test_json_shape() {
        let report = JsonTelemetryReport::from_scored(&[scored("t0", 28.0, 0.45, false)])
            .with_model(JsonModelSummary {
                tree_count: 100,
                sample_size: 256,
                contamination: 0.05,
                threshold: 0.6,
            })
            .with_faults(&[RowFault {
                row: 3,
                id: None,
                error: DetectorError::NotFitted,
            }]);

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["normal"][0]["timestamp"], "t0");
        assert_eq!(value["normal"][0]["anomaly_score"], 0.45);
        assert!(value["anomalies"].as_array().unwrap().is_empty());
        assert_eq!(value["stats"]["voltage_mean"], 28.0);
        assert_eq!(value["model"]["tree_count"], 100);
        assert_eq!(value["faults"][0]["row"], 3);
    }

    #[test]
    fn test_faults_omitted_when_empty() {
        let json = JsonTelemetryReport::from_scored(&[]).to_json().unwrap();
        assert!(!json.contains("faults"));
        assert!(!json.contains("model"));
    }
}
