//! Isolation Forest ensemble
//!
//! Owns a fixed number of independently built partition trees. Every tree gets
//! its own sub-seed drawn from one master generator, so the forest is a pure
//! function of `(input order, params, seed)` whether the trees are built in
//! parallel or one after another.

use crate::config::SamplingPolicy;
use crate::dataset::{FeatureMatrix, NUM_FEATURES};
use crate::error::{DetectorError, Result};
use crate::scorer::average_path_length;
use crate::tree::{max_depth_for, PartitionTree};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Default number of trees
pub const DEFAULT_TREE_COUNT: usize = 100;

/// Default sub-sampling size (following original paper)
pub const DEFAULT_SAMPLE_SIZE: usize = 256;

/// Fit-time parameters for a forest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub tree_count: usize,
    pub sample_size: usize,
    /// Build trees on the rayon thread pool
    pub parallel: bool,
    /// What to do when `sample_size` does not fit inside the training set
    pub sampling: SamplingPolicy,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::new(DEFAULT_TREE_COUNT, DEFAULT_SAMPLE_SIZE)
    }
}

impl ForestParams {
    pub fn new(tree_count: usize, sample_size: usize) -> Self {
        Self {
            tree_count,
            sample_size,
            parallel: true,
            sampling: SamplingPolicy::Reject,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }

    /// Check tree count and sample size
    pub fn validate(&self) -> Result<()> {
        if self.tree_count < 1 {
            return Err(DetectorError::invalid_config(format!(
                "tree_count must be >= 1, got {}",
                self.tree_count
            )));
        }
        if self.sample_size < 2 {
            return Err(DetectorError::invalid_config(format!(
                "sample_size must be >= 2, got {}",
                self.sample_size
            )));
        }
        Ok(())
    }
}

/// A fitted Isolation Forest
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<PartitionTree>,
    sample_size: usize,
    max_depth: usize,
    normalization: f64,
}

impl Forest {
    /// Fit a forest on `matrix`
    ///
    /// `seed` pins every random choice. With `None` the master seed is drawn
    /// from OS entropy. Either the whole forest is returned or an error is;
    /// nothing partial escapes.
    pub fn fit(matrix: &FeatureMatrix, params: &ForestParams, seed: Option<u64>) -> Result<Self> {
        params.validate()?;
        let rows = matrix.rows();

        if rows.is_empty() {
            return Err(DetectorError::invalid_config(
                "cannot fit a forest on an empty dataset",
            ));
        }

        let with_replacement = params.sample_size >= rows.len();
        if with_replacement && params.sampling == SamplingPolicy::Reject {
            return Err(DetectorError::invalid_config(format!(
                "sample_size ({}) must be smaller than the number of rows ({}); \
                 lower sample_size or use the with-replacement sampling policy",
                params.sample_size,
                rows.len()
            )));
        }

        let sample_size = params.sample_size;
        let max_depth = max_depth_for(sample_size);
        let seed = seed.unwrap_or_else(rand::random);

        tracing::debug!(
            "Fitting isolation forest: rows={} trees={} sample_size={} max_depth={} seed={} replacement={}",
            rows.len(),
            params.tree_count,
            sample_size,
            max_depth,
            seed,
            with_replacement
        );

        // Sub-seeds are drawn in tree order before any tree is built
        let mut master = StdRng::seed_from_u64(seed);
        let tree_seeds: Vec<u64> = (0..params.tree_count).map(|_| master.gen()).collect();

        let build = |tree_seed: u64| {
            let mut rng = StdRng::seed_from_u64(tree_seed);
            let sample = draw_sample(rows, sample_size, with_replacement, &mut rng);
            PartitionTree::build(&sample, max_depth, &mut rng)
        };

        let trees: Vec<PartitionTree> = if params.parallel {
            tree_seeds.into_par_iter().map(build).collect()
        } else {
            tree_seeds.into_iter().map(build).collect()
        };

        Ok(Forest {
            trees,
            sample_size,
            max_depth,
            normalization: average_path_length(sample_size),
        })
    }

    pub fn trees(&self) -> &[PartitionTree] {
        &self.trees
    }

    /// Rows drawn per tree
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Height limit every tree was built with
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// c(sample_size), the path length scores are normalized by
    pub fn normalization(&self) -> f64 {
        self.normalization
    }
}

/// Draw one bootstrap sample
fn draw_sample<R: Rng + ?Sized>(
    rows: &[[f64; NUM_FEATURES]],
    size: usize,
    with_replacement: bool,
    rng: &mut R,
) -> Vec<[f64; NUM_FEATURES]> {
    if with_replacement {
        (0..size).map(|_| rows[rng.gen_range(0..rows.len())]).collect()
    } else {
        index::sample(rng, rows.len(), size)
            .into_iter()
            .map(|i| rows[i])
            .collect()
    }
}
