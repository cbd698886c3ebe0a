//! Error taxonomy for the anomaly detection core
//!
//! Validation failures carry the row index, the row identifier (when the
//! record has one) and the offending field so the caller can act on them.

use thiserror::Error;

/// Errors raised by the dataset adapter, forest, classifier and detector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// A required field is missing or is not numeric
    #[error("Schema error at row {row}{}: field '{field}' {reason}", fmt_id(.id))]
    Schema {
        row: usize,
        id: Option<String>,
        field: String,
        reason: String,
    },

    /// A numeric field is NaN or infinite
    #[error("Value error at row {row}{}: field '{field}' is not finite ({value})", fmt_id(.id))]
    Value {
        row: usize,
        id: Option<String>,
        field: String,
        value: f64,
    },

    /// Tree count, sample size, contamination or sampling policy outside its domain
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Scoring attempted before the detector was fit
    #[error("Detector is not fitted; call fit() before scoring")]
    NotFitted,
}

fn fmt_id(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" ({})", id),
        None => String::new(),
    }
}

impl DetectorError {
    /// Shorthand for an `InvalidConfig` error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        DetectorError::InvalidConfig(msg.into())
    }

    /// Row index this error refers to, if any
    pub fn row(&self) -> Option<usize> {
        match self {
            DetectorError::Schema { row, .. } | DetectorError::Value { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// Result type for detector operations
pub type Result<T> = std::result::Result<T, DetectorError>;
