//! Dataset adapter: turns heterogeneous telemetry records into a feature matrix
//!
//! This is the only part of the crate that looks at collaborator-shaped rows.
//! Everything downstream works on `[f64; NUM_FEATURES]` in stable input order.

use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of feature columns used for splitting
pub const NUM_FEATURES: usize = 3;

/// Feature column names, in matrix column order
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = ["voltage", "signal_strength", "apogee"];

/// Field carrying the opaque passthrough identifier
pub const ID_FIELD: &str = "timestamp";

/// A raw field value as exposed by a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawField<'a> {
    /// Already numeric
    Number(f64),
    /// Textual value, parsed as `f64` by the adapter
    Text(&'a str),
    /// Any other kind of value (the name of the kind, e.g. "boolean")
    Other(&'static str),
}

/// Row-like input the adapter can extract features from
pub trait TelemetryRecord {
    /// Opaque identifier carried through to the output (e.g. a timestamp)
    fn identifier(&self) -> Option<String>;

    /// Look up a field by name
    fn field(&self, name: &str) -> Option<RawField<'_>>;
}

/// One telemetry sample: three finite features plus an optional identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub voltage: f64,
    pub signal_strength: f64,
    pub apogee: f64,
}

impl FeatureRow {
    /// Create an untagged row
    pub fn new(voltage: f64, signal_strength: f64, apogee: f64) -> Self {
        Self {
            timestamp: None,
            voltage,
            signal_strength,
            apogee,
        }
    }

    /// Attach an identifier
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Features in matrix column order
    pub fn values(&self) -> [f64; NUM_FEATURES] {
        [self.voltage, self.signal_strength, self.apogee]
    }

    fn from_values(timestamp: Option<String>, values: [f64; NUM_FEATURES]) -> Self {
        Self {
            timestamp,
            voltage: values[0],
            signal_strength: values[1],
            apogee: values[2],
        }
    }
}

impl TelemetryRecord for FeatureRow {
    fn identifier(&self) -> Option<String> {
        self.timestamp.clone()
    }

    fn field(&self, name: &str) -> Option<RawField<'_>> {
        match name {
            "voltage" => Some(RawField::Number(self.voltage)),
            "signal_strength" => Some(RawField::Number(self.signal_strength)),
            "apogee" => Some(RawField::Number(self.apogee)),
            _ => None,
        }
    }
}

impl TelemetryRecord for serde_json::Value {
    fn identifier(&self) -> Option<String> {
        match self.get(ID_FIELD)? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    fn field(&self, name: &str) -> Option<RawField<'_>> {
        use serde_json::Value;

        let value = self.as_object()?.get(name)?;
        Some(match value {
            // as_f64 only fails for arbitrary-precision numbers, which we do not enable
            Value::Number(n) => n.as_f64().map_or(RawField::Other("number"), RawField::Number),
            Value::String(s) => RawField::Text(s),
            Value::Null => RawField::Other("null"),
            Value::Bool(_) => RawField::Other("boolean"),
            Value::Array(_) => RawField::Other("array"),
            Value::Object(_) => RawField::Other("object"),
        })
    }
}

impl TelemetryRecord for HashMap<String, String> {
    fn identifier(&self) -> Option<String> {
        self.get(ID_FIELD).filter(|s| !s.is_empty()).cloned()
    }

    fn field(&self, name: &str) -> Option<RawField<'_>> {
        self.get(name).map(|s| RawField::Text(s.as_str()))
    }
}

/// Dense `rows × NUM_FEATURES` matrix with the row identifiers alongside
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<[f64; NUM_FEATURES]>,
    ids: Vec<Option<String>>,
}

impl FeatureMatrix {
    /// Build a matrix from raw values, rejecting non-finite entries
    pub fn from_values(rows: Vec<[f64; NUM_FEATURES]>) -> Result<Self> {
        for (row, values) in rows.iter().enumerate() {
            check_finite(row, &None, values)?;
        }
        let ids = vec![None; rows.len()];
        Ok(Self { rows, ids })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature values of every row
    pub fn rows(&self) -> &[[f64; NUM_FEATURES]] {
        &self.rows
    }

    /// Identifiers, parallel to `rows()`
    pub fn ids(&self) -> &[Option<String>] {
        &self.ids
    }

    /// Rebuild the `FeatureRow` at `index`
    pub fn feature_row(&self, index: usize) -> Option<FeatureRow> {
        let values = *self.rows.get(index)?;
        Some(FeatureRow::from_values(self.ids[index].clone(), values))
    }

    /// Values of one column
    pub fn column(&self, feature_idx: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[feature_idx]).collect()
    }

    fn push(&mut self, row: FeatureRow) {
        self.rows.push(row.values());
        self.ids.push(row.timestamp);
    }
}

/// A row that could not be turned into features
#[derive(Debug, Clone, PartialEq)]
pub struct RowFault {
    /// Position of the record in the input
    pub row: usize,
    /// Record identifier, if it had one
    pub id: Option<String>,
    pub error: DetectorError,
}

/// Result of lenient extraction: good rows plus one fault per bad row
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub matrix: FeatureMatrix,
    /// Input position of each matrix row
    pub positions: Vec<usize>,
    pub faults: Vec<RowFault>,
}

/// Extract and validate a single record
pub fn extract_row<R: TelemetryRecord + ?Sized>(row: usize, record: &R) -> Result<FeatureRow> {
    let id = record.identifier();
    let mut values = [0.0; NUM_FEATURES];

    for (slot, name) in values.iter_mut().zip(FEATURE_NAMES) {
        *slot = numeric_field(row, &id, record, name)?;
    }
    check_finite(row, &id, &values)?;

    Ok(FeatureRow::from_values(id, values))
}

/// Extract every record, failing on the first invalid one
pub fn extract<R: TelemetryRecord>(records: &[R]) -> Result<FeatureMatrix> {
    let mut matrix = FeatureMatrix {
        rows: Vec::with_capacity(records.len()),
        ids: Vec::with_capacity(records.len()),
    };
    for (row, record) in records.iter().enumerate() {
        matrix.push(extract_row(row, record)?);
    }
    Ok(matrix)
}

/// Extract every record, collecting a fault for each invalid one
pub fn extract_lenient<R: TelemetryRecord>(records: &[R]) -> Extraction {
    let mut out = Extraction::default();
    for (row, record) in records.iter().enumerate() {
        match extract_row(row, record) {
            Ok(features) => {
                out.matrix.push(features);
                out.positions.push(row);
            }
            Err(error) => {
                tracing::warn!("Skipping telemetry row {}: {}", row, error);
                out.faults.push(RowFault {
                    row,
                    id: record.identifier(),
                    error,
                });
            }
        }
    }
    out
}

fn numeric_field<R: TelemetryRecord + ?Sized>(
    row: usize,
    id: &Option<String>,
    record: &R,
    name: &str,
) -> Result<f64> {
    let schema_error = |reason: String| DetectorError::Schema {
        row,
        id: id.clone(),
        field: name.to_string(),
        reason,
    };

    match record.field(name) {
        None => Err(schema_error("is missing".to_string())),
        Some(RawField::Number(v)) => Ok(v),
        Some(RawField::Text(s)) if s.trim().is_empty() => Err(schema_error("is empty".to_string())),
        Some(RawField::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| schema_error(format!("is not numeric (found '{}')", s))),
        Some(RawField::Other(kind)) => Err(schema_error(format!("expected a number, found {}", kind))),
    }
}

fn check_finite(row: usize, id: &Option<String>, values: &[f64; NUM_FEATURES]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(idx) => Err(DetectorError::Value {
            row,
            id: id.clone(),
            field: FEATURE_NAMES[idx].to_string(),
            value: values[idx],
        }),
        None => Ok(()),
    }
}
