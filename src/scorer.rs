//! Path-length scoring for a fitted forest
//!
//! A row's anomaly score is `2^(-E[h(x)] / c(ψ))`, where `E[h(x)]` is the mean
//! isolation path length over all trees and `c(ψ)` is the expected path length
//! of an unsuccessful BST search over the per-tree sample size ψ.
//!
//! # References
//!
//! Liu, F. T., Ting, K. M., & Zhou, Z. H. (2008). Isolation forest.
//! In 2008 Eighth IEEE International Conference on Data Mining (pp. 413-422).

use crate::dataset::{FeatureMatrix, NUM_FEATURES};
use crate::forest::Forest;
use rayon::prelude::*;

/// Euler–Mascheroni constant used in the harmonic number approximation
pub const EULER_GAMMA: f64 = 0.5772156649;

/// Harmonic number approximation: H(i) ≈ ln(i) + γ
pub fn harmonic(i: f64) -> f64 {
    i.ln() + EULER_GAMMA
}

/// Expected path length c(n) of an unsuccessful search in a random BST of n points
///
/// `c(n) = 2·H(n−1) − 2·(n−1)/n`, with `c(n) = 1` for `n <= 1` so it is always
/// safe to divide by.
pub fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 1.0;
    }
    let n_minus_1 = (n - 1) as f64;
    2.0 * harmonic(n_minus_1) - 2.0 * n_minus_1 / n as f64
}

/// Extra depth credited to a leaf holding `count` training rows
///
/// Accounts for the subtree that was never grown below the leaf.
pub fn leaf_adjustment(count: usize) -> f64 {
    if count <= 1 {
        0.0
    } else {
        average_path_length(count)
    }
}

/// Convert a mean path length into an anomaly score in (0, 1]
pub fn score_from_path_length(avg_path_length: f64, normalization: f64) -> f64 {
    2_f64.powf(-avg_path_length / normalization)
}

impl Forest {
    /// Mean path length of `row` across all trees
    pub fn average_path_length(&self, row: &[f64; NUM_FEATURES]) -> f64 {
        let total: f64 = self.trees().iter().map(|tree| tree.path_length(row)).sum();
        total / self.trees().len() as f64
    }

    /// Anomaly score for one row (higher = more anomalous)
    ///
    /// Scores near 1 are strong anomalies, scores near 0.5 are typical.
    pub fn score(&self, row: &[f64; NUM_FEATURES]) -> f64 {
        score_from_path_length(self.average_path_length(row), self.normalization())
    }

    /// Score every row of a matrix, in row order
    pub fn score_matrix(&self, matrix: &FeatureMatrix) -> Vec<f64> {
        self.score_rows(matrix.rows())
    }

    /// Score a slice of rows in parallel, preserving order
    pub fn score_rows(&self, rows: &[[f64; NUM_FEATURES]]) -> Vec<f64> {
        rows.par_iter().map(|row| self.score(row)).collect()
    }
}
