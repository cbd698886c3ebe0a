//! Contamination-rate threshold classifier
//!
//! The threshold is the (1 − r) quantile of the training scores, computed once
//! at fit time and reused for every later score.

use crate::config::validate_contamination;
use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};

/// Binary labeler over anomaly scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdClassifier {
    threshold: f64,
    contamination: f64,
}

impl ThresholdClassifier {
    /// Derive the threshold from training scores
    pub fn fit(scores: &[f64], contamination: f64) -> Result<Self> {
        validate_contamination(contamination)?;
        if scores.is_empty() {
            return Err(DetectorError::invalid_config(
                "cannot derive a threshold from an empty score set",
            ));
        }

        let threshold = quantile(scores, 1.0 - contamination);
        tracing::debug!(
            "Anomaly threshold {:.6} at contamination {} over {} scores",
            threshold,
            contamination,
            scores.len()
        );

        Ok(Self {
            threshold,
            contamination,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// `true` when `score` is at or above the threshold
    pub fn is_anomaly(&self, score: f64) -> bool {
        score >= self.threshold
    }
}

/// Quantile with linear interpolation between order statistics
///
/// Uses position `h = (n − 1)·q` on the sorted values, so `q = 0` is the
/// minimum and `q = 1` the maximum. `values` must be non-empty.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
