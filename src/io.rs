//! Reading telemetry tables from CSV and JSON
//!
//! CSV rows come back as header-keyed string maps and JSON rows as
//! `serde_json::Value` objects; both implement `TelemetryRecord`.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Telemetry rows as loaded from disk
#[derive(Debug, Clone)]
pub enum LoadedRecords {
    Csv(Vec<HashMap<String, String>>),
    Json(Vec<serde_json::Value>),
}

impl LoadedRecords {
    pub fn len(&self) -> usize {
        match self {
            LoadedRecords::Csv(rows) => rows.len(),
            LoadedRecords::Json(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read CSV rows keyed by header name
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<HashMap<String, String>>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", idx))?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Read a JSON array of row objects
pub fn read_json<R: Read>(reader: R) -> Result<Vec<serde_json::Value>> {
    let value: serde_json::Value =
        serde_json::from_reader(reader).context("Failed to parse JSON input")?;
    match value {
        serde_json::Value::Array(rows) => Ok(rows),
        other => anyhow::bail!(
            "Expected a JSON array of telemetry rows, found {}",
            json_kind(&other)
        ),
    }
}

/// Load a telemetry file, choosing the parser by extension (`.json` or CSV)
pub fn load_records(path: &Path) -> Result<LoadedRecords> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let records = if is_json {
        LoadedRecords::Json(read_json(file).with_context(|| path.display().to_string())?)
    } else {
        LoadedRecords::Csv(read_csv(file).with_context(|| path.display().to_string())?)
    };

    tracing::debug!("Loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Write `contents` to `path`, or to stdout when no path is given
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{}", contents);
            Ok(())
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
