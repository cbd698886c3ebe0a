//! satwatch - Unsupervised anomaly detection for satellite telemetry
//!
//! This library provides an Isolation Forest engine that scores multivariate
//! telemetry (voltage, signal strength, apogee) and labels anomalous rows at a
//! configured contamination rate, plus the small I/O layer around it.
//!
//! # Example
//!
//! ```
//! use satwatch::config::DetectorConfig;
//! use satwatch::detector::AnomalyDetector;
//! use satwatch::generator::{generate, GeneratorConfig};
//!
//! let telemetry = generate(&GeneratorConfig { seed: Some(42), ..Default::default() }).unwrap();
//! let mut detector = AnomalyDetector::new(DetectorConfig::default().with_seed(42)).unwrap();
//! let labeled = detector.fit(&telemetry.rows).unwrap();
//! assert_eq!(labeled.len(), 1000);
//! ```

pub mod classifier;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod forest;
pub mod generator;
pub mod io;
pub mod json_output;
pub mod scorer;
pub mod tree;

pub use detector::{AnomalyDetector, BatchScore, ScoredRow};
pub use error::{DetectorError, Result};
