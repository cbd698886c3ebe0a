//! Fit/score pipeline for telemetry anomaly detection
//!
//! records → dataset adapter → forest → path-length scores → threshold labels

use crate::classifier::ThresholdClassifier;
use crate::config::DetectorConfig;
use crate::dataset::{self, FeatureMatrix, FeatureRow, RowFault, TelemetryRecord};
use crate::error::{DetectorError, Result};
use crate::forest::Forest;
use serde::{Deserialize, Serialize};

/// A telemetry row with its anomaly score and label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    #[serde(flatten)]
    pub row: FeatureRow,
    /// Anomaly score in (0, 1]; higher is more anomalous
    pub anomaly_score: f64,
    pub is_anomaly: bool,
}

/// Outcome of scoring a batch: every good row is scored, every bad row reported
#[derive(Debug, Clone, Default)]
pub struct BatchScore {
    /// Scored rows in input order
    pub scored: Vec<ScoredRow>,
    /// Rows that could not be scored, in input order
    pub faults: Vec<RowFault>,
}

impl BatchScore {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.scored.iter().filter(|r| r.is_anomaly).count()
    }
}

/// Model state produced by one successful fit
#[derive(Debug, Clone)]
struct Fitted {
    forest: Forest,
    classifier: ThresholdClassifier,
}

/// Isolation Forest anomaly detector with a persistent labeling threshold
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: DetectorConfig,
    fitted: Option<Fitted>,
}

impl AnomalyDetector {
    /// Create a detector, validating the configuration up front
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fitted: None,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fitted forest, if any
    pub fn forest(&self) -> Option<&Forest> {
        self.fitted.as_ref().map(|f| &f.forest)
    }

    /// Labeling threshold derived at fit time, if fitted
    pub fn threshold(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.classifier.threshold())
    }

    /// Fit on `records` and return them scored and labeled
    ///
    /// Any invalid record aborts the fit before a tree is built. A failed fit
    /// leaves the previous model (if any) untouched.
    pub fn fit<R: TelemetryRecord>(&mut self, records: &[R]) -> Result<Vec<ScoredRow>> {
        let matrix = dataset::extract(records)?;
        self.fit_matrix(&matrix)
    }

    /// Fit on an already validated matrix
    pub fn fit_matrix(&mut self, matrix: &FeatureMatrix) -> Result<Vec<ScoredRow>> {
        let forest = Forest::fit(matrix, &self.config.forest_params(), self.config.seed)?;
        let scores = forest.score_matrix(matrix);
        let classifier = ThresholdClassifier::fit(&scores, self.config.contamination)?;

        let labeled: Vec<ScoredRow> = scores
            .iter()
            .enumerate()
            .filter_map(|(i, &score)| {
                matrix.feature_row(i).map(|row| ScoredRow {
                    row,
                    anomaly_score: score,
                    is_anomaly: classifier.is_anomaly(score),
                })
            })
            .collect();

        tracing::info!(
            "Fitted {} trees on {} rows; {} labeled anomalous (threshold {:.4})",
            forest.trees().len(),
            matrix.len(),
            labeled.iter().filter(|r| r.is_anomaly).count(),
            classifier.threshold()
        );

        self.fitted = Some(Fitted { forest, classifier });
        Ok(labeled)
    }

    /// Score one row against the stored forest and threshold
    ///
    /// Validation errors report row index 0, the single row being scored.
    pub fn score_row(&self, row: &FeatureRow) -> Result<ScoredRow> {
        let fitted = self.fitted.as_ref().ok_or(DetectorError::NotFitted)?;
        let row = dataset::extract_row(0, row)?;
        let score = fitted.forest.score(&row.values());
        Ok(ScoredRow {
            row,
            anomaly_score: score,
            is_anomaly: fitted.classifier.is_anomaly(score),
        })
    }

    /// Score a batch without refitting
    ///
    /// Bad rows become faults in the result; they never abort the batch.
    pub fn score_records<R: TelemetryRecord>(&self, records: &[R]) -> Result<BatchScore> {
        let fitted = self.fitted.as_ref().ok_or(DetectorError::NotFitted)?;
        let extraction = dataset::extract_lenient(records);
        let scores = fitted.forest.score_matrix(&extraction.matrix);

        let scored = scores
            .iter()
            .enumerate()
            .filter_map(|(i, &score)| {
                extraction.matrix.feature_row(i).map(|row| ScoredRow {
                    row,
                    anomaly_score: score,
                    is_anomaly: fitted.classifier.is_anomaly(score),
                })
            })
            .collect();

        if !extraction.faults.is_empty() {
            tracing::warn!(
                "{} of {} rows could not be scored",
                extraction.faults.len(),
                records.len()
            );
        }

        Ok(BatchScore {
            scored,
            faults: extraction.faults,
        })
    }
}
