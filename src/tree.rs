//! Randomized partition (isolation) trees
//!
//! Each tree recursively splits its bootstrap sample on a random feature at a
//! random threshold between the subset's min and max for that feature.
//! Anomalies end up isolated close to the root.

use crate::dataset::NUM_FEATURES;
use crate::scorer::leaf_adjustment;
use rand::Rng;

/// A node in a partition tree
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionNode {
    /// Internal node with split feature and threshold
    Internal {
        feature_idx: usize,
        threshold: f64,
        left: Box<PartitionNode>,
        right: Box<PartitionNode>,
    },
    /// Leaf with the number of training rows that reached it
    Leaf { count: usize, depth: usize },
}

impl PartitionNode {
    fn build<R: Rng + ?Sized>(
        rows: &[[f64; NUM_FEATURES]],
        depth: usize,
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        let leaf = PartitionNode::Leaf {
            count: rows.len(),
            depth,
        };

        if rows.len() <= 1 || depth >= max_depth {
            return leaf;
        }

        let feature_idx = rng.gen_range(0..NUM_FEATURES);

        // Range of the chosen feature within this subset only
        let (min_val, max_val) = rows.iter().fold((f64::MAX, f64::MIN), |(lo, hi), r| {
            (lo.min(r[feature_idx]), hi.max(r[feature_idx]))
        });

        // Constant feature: no split can separate these rows
        if min_val >= max_val {
            return leaf;
        }

        // Interpolate instead of sampling `min..max` so a span wider than
        // f64::MAX cannot overflow
        let t: f64 = rng.gen();
        let mut threshold = min_val * (1.0 - t) + max_val * t;
        if !(min_val..max_val).contains(&threshold) {
            threshold = min_val;
        }

        let (left_rows, right_rows): (Vec<_>, Vec<_>) =
            rows.iter().copied().partition(|r| r[feature_idx] < threshold);

        let left = Box::new(Self::build(&left_rows, depth + 1, max_depth, rng));
        let right = Box::new(Self::build(&right_rows, depth + 1, max_depth, rng));

        PartitionNode::Internal {
            feature_idx,
            threshold,
            left,
            right,
        }
    }

    /// Walk down to the leaf `row` falls into
    fn leaf_for(&self, row: &[f64; NUM_FEATURES]) -> (usize, usize) {
        let mut node = self;
        loop {
            match node {
                PartitionNode::Internal {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature_idx] < *threshold {
                        &**left
                    } else {
                        &**right
                    };
                }
                PartitionNode::Leaf { count, depth } => return (*count, *depth),
            }
        }
    }

    fn visit<F: FnMut(&PartitionNode)>(&self, f: &mut F) {
        f(self);
        if let PartitionNode::Internal { left, right, .. } = self {
            left.visit(f);
            right.visit(f);
        }
    }
}

/// Maximum tree height for a given per-tree sample size: ⌈log2(ψ)⌉
pub fn max_depth_for(sample_size: usize) -> usize {
    if sample_size <= 1 {
        return 0;
    }
    (sample_size as f64).log2().ceil() as usize
}

/// A single isolation tree, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionTree {
    root: PartitionNode,
}

impl PartitionTree {
    /// Build a tree from a bootstrap sample
    ///
    /// All randomness comes from `rng`, so a seeded generator gives a
    /// reproducible tree.
    pub fn build<R: Rng + ?Sized>(
        sample: &[[f64; NUM_FEATURES]],
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        PartitionTree {
            root: PartitionNode::build(sample, 0, max_depth, rng),
        }
    }

    pub fn root(&self) -> &PartitionNode {
        &self.root
    }

    /// Isolation path length of `row`: leaf depth plus the leaf's c(count) adjustment
    pub fn path_length(&self, row: &[f64; NUM_FEATURES]) -> f64 {
        let (count, depth) = self.root.leaf_for(row);
        depth as f64 + leaf_adjustment(count)
    }

    /// Deepest leaf in the tree
    pub fn height(&self) -> usize {
        let mut height = 0;
        self.root.visit(&mut |node| {
            if let PartitionNode::Leaf { depth, .. } = node {
                height = height.max(*depth);
            }
        });
        height
    }

    /// Sum of leaf counts, equal to the sample size the tree was built from
    pub fn total_count(&self) -> usize {
        let mut total = 0;
        self.root.visit(&mut |node| {
            if let PartitionNode::Leaf { count, .. } = node {
                total += count;
            }
        });
        total
    }

    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.root.visit(&mut |_| n += 1);
        n
    }
}
