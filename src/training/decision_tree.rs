//! Decision tree implementation
//!
//! Trees are stored as a flat node arena so that serialized models nest
//! no deeper than one level regardless of tree depth.

use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node. Children are indices into the owning tree's arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, weight: f64 },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: usize,
        right: usize,
        gain: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Criterion {
    /// Gini impurity (binary classification)
    Gini,
    /// Mean squared error (regression on residuals)
    MSE,
}

/// Weighted sufficient statistics of a set of rows
#[derive(Debug, Clone, Copy, Default)]
struct NodeStats {
    count: usize,
    w: f64,
    wy: f64,
    wyy: f64,
}

impl NodeStats {
    fn push(&mut self, y: f64, w: f64) {
        self.count += 1;
        self.w += w;
        self.wy += w * y;
        self.wyy += w * y * y;
    }

    fn minus(&self, other: &NodeStats) -> NodeStats {
        NodeStats {
            count: self.count - other.count,
            w: self.w - other.w,
            wy: self.wy - other.wy,
            wyy: self.wyy - other.wyy,
        }
    }

    /// Weighted mean target; the churn fraction for 0/1 labels
    fn mean(&self) -> f64 {
        if self.w > 0.0 {
            self.wy / self.w
        } else {
            0.0
        }
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.w <= 0.0 {
            return 0.0;
        }
        let p = self.mean();
        match criterion {
            Criterion::Gini => 2.0 * p * (1.0 - p),
            Criterion::MSE => (self.wyy / self.w - p * p).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

struct BuildContext<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    weights: &'a [f64],
    features: &'a [usize],
    rng: ChaCha8Rng,
    nodes: Vec<TreeNode>,
    importances: Vec<f64>,
}

/// CART-style binary tree over dense features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features examined per node; all when `None`
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for per-node feature sampling
    pub random_state: u64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_classifier()
    }
}

impl DecisionTree {
    /// Create a new classifier tree; leaves hold the weighted churn fraction
    pub fn new_classifier() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Create a new regressor tree; leaves hold the weighted mean target
    pub fn new_regressor() -> Self {
        Self {
            criterion: Criterion::MSE,
            ..Self::new_classifier()
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set number of features examined per node
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set seed for feature sampling
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the tree to all rows with unit weights
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let weights = vec![1.0; x.nrows()];
        let rows: Vec<usize> = (0..x.nrows()).collect();
        let features: Vec<usize> = (0..x.ncols()).collect();
        self.fit_subset(x, y, &weights, rows, &features)
    }

    /// Fit on the given rows (duplicates allowed) restricted to `features`
    pub fn fit_subset(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        weights: &[f64],
        rows: Vec<usize>,
        features: &[usize],
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() || x.nrows() != weights.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y and weights length = {}", x.nrows()),
                actual: format!("y = {}, weights = {}", y.len(), weights.len()),
            });
        }
        if rows.is_empty() {
            return Err(ChurnError::TrainingError(
                "cannot fit a tree on zero rows".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut ctx = BuildContext {
            x,
            y,
            weights,
            features,
            rng: ChaCha8Rng::seed_from_u64(self.random_state),
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        self.build(&mut ctx, rows, 0);

        let total: f64 = ctx.importances.iter().sum();
        if total > 0.0 {
            for imp in &mut ctx.importances {
                *imp /= total;
            }
        }
        self.nodes = ctx.nodes;
        self.feature_importances = Some(Array1::from_vec(ctx.importances));
        Ok(self)
    }

    fn build(&self, ctx: &mut BuildContext<'_>, rows: Vec<usize>, depth: usize) -> usize {
        let mut stats = NodeStats::default();
        for &i in &rows {
            stats.push(ctx.y[i], ctx.weights[i]);
        }

        let node_idx = ctx.nodes.len();
        ctx.nodes.push(TreeNode::Leaf {
            value: stats.mean(),
            weight: stats.w,
        });

        let should_stop = rows.len() < self.min_samples_split
            || rows.len() < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || stats.w <= 0.0
            || stats.impurity(self.criterion) <= 1e-12;
        if should_stop {
            return node_idx;
        }

        let candidates = self.candidate_features(ctx);
        let Some(split) = self.find_best_split(ctx, &rows, &stats, &candidates) else {
            return node_idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| ctx.x[[i, split.feature_idx]] <= split.threshold);

        ctx.importances[split.feature_idx] += stats.w * split.gain;

        let left = self.build(ctx, left_rows, depth + 1);
        let right = self.build(ctx, right_rows, depth + 1);
        ctx.nodes[node_idx] = TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            gain: split.gain,
        };
        node_idx
    }

    fn candidate_features(&self, ctx: &mut BuildContext<'_>) -> Vec<usize> {
        match self.max_features {
            Some(k) if k > 0 && k < ctx.features.len() => {
                let mut picked: Vec<usize> = sample(&mut ctx.rng, ctx.features.len(), k)
                    .into_iter()
                    .map(|j| ctx.features[j])
                    .collect();
                picked.sort_unstable();
                picked
            }
            _ => ctx.features.to_vec(),
        }
    }

    fn find_best_split(
        &self,
        ctx: &BuildContext<'_>,
        rows: &[usize],
        parent: &NodeStats,
        candidates: &[usize],
    ) -> Option<SplitCandidate> {
        let parent_impurity = parent.impurity(self.criterion);
        let (x, y, weights) = (ctx.x, ctx.y, ctx.weights);

        // Each feature is swept independently
        let per_feature: Vec<Option<SplitCandidate>> = candidates
            .par_iter()
            .map(|&feature_idx| {
                let mut column: Vec<(f64, usize)> =
                    rows.iter().map(|&i| (x[[i, feature_idx]], i)).collect();
                column.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut left = NodeStats::default();
                let mut best: Option<SplitCandidate> = None;
                for pos in 0..column.len() - 1 {
                    let (value, i) = column[pos];
                    left.push(y[i], weights[i]);
                    let next_value = column[pos + 1].0;
                    if next_value <= value {
                        continue;
                    }
                    let right = parent.minus(&left);
                    if left.count < self.min_samples_leaf || right.count < self.min_samples_leaf {
                        continue;
                    }
                    if left.w <= 0.0 || right.w <= 0.0 {
                        continue;
                    }
                    let child = (left.w * left.impurity(self.criterion)
                        + right.w * right.impurity(self.criterion))
                        / parent.w;
                    let gain = parent_impurity - child;
                    if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (value + next_value) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        // Lowest feature index wins ties
        per_feature
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, c| match acc {
                Some(a) if a.gain >= c.gain => Some(a),
                _ => Some(c),
            })
    }

    /// Leaf value reached by a single row
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature_idx] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Leaf values for every row of `x`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.nodes.is_empty() {
            return Err(ChurnError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }

    /// Normalized impurity decrease per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Depth counted in levels; a lone leaf has depth 1
    pub fn get_depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let TreeNode::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }
}
