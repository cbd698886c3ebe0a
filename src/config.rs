//! Detector configuration
//!
//! Loaded from TOML or built in code; command-line flags override file values.

use crate::error::{DetectorError, Result};
use crate::forest::{ForestParams, DEFAULT_SAMPLE_SIZE, DEFAULT_TREE_COUNT};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behavior when `sample_size` is not smaller than the training set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingPolicy {
    /// Fail with an invalid-configuration error (default)
    #[default]
    Reject,
    /// Draw each tree's sample with replacement
    WithReplacement,
}

/// Configuration for the anomaly detector
///
/// # Example
/// ```
/// use satwatch::config::DetectorConfig;
///
/// let config = DetectorConfig::default();
/// assert_eq!(config.tree_count, 100);
/// assert_eq!(config.contamination, 0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Number of isolation trees in the forest
    pub tree_count: usize,

    /// Rows drawn (without replacement) to build each tree
    ///
    /// Also fixes the height limit ⌈log2(sample_size)⌉ and the score
    /// normalization constant c(sample_size).
    pub sample_size: usize,

    /// Expected fraction of anomalous rows, in (0, 0.5)
    ///
    /// The (1 − contamination) quantile of the training scores becomes the
    /// labeling threshold.
    pub contamination: f64,

    /// Seed for reproducible fits; `None` draws one from OS entropy
    pub seed: Option<u64>,

    /// Build trees on all cores
    pub parallel: bool,

    pub sampling: SamplingPolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tree_count: DEFAULT_TREE_COUNT,
            sample_size: DEFAULT_SAMPLE_SIZE,
            contamination: 0.05,
            seed: None,
            parallel: true,
            sampling: SamplingPolicy::Reject,
        }
    }
}

impl DetectorConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)
            .map_err(|e| DetectorError::invalid_config(format!("bad TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DetectorError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Forest-level subset of the configuration
    pub fn forest_params(&self) -> ForestParams {
        ForestParams::new(self.tree_count, self.sample_size)
            .with_parallel(self.parallel)
            .with_sampling(self.sampling)
    }

    /// Validate every field before any work starts
    pub fn validate(&self) -> Result<()> {
        self.forest_params().validate()?;
        validate_contamination(self.contamination)
    }
}

/// Contamination must lie strictly between 0 and 0.5
pub fn validate_contamination(contamination: f64) -> Result<()> {
    if contamination > 0.0 && contamination < 0.5 {
        Ok(())
    } else {
        Err(DetectorError::invalid_config(format!(
            "contamination must be in (0, 0.5), got {}",
            contamination
        )))
    }
}
