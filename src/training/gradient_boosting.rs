//! Gradient Boosting implementation
//!
//! Boosted regression trees on the log-loss gradient, with row and column
//! subsampling per round and positive-class upweighting.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision_tree::DecisionTree;
use super::models::{check_binary_targets, ClassWeight, Classifier};
use crate::error::{ChurnError, Result};

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Subsample ratio for each tree
    pub subsample: f64,
    /// Column subsample ratio
    pub colsample_bytree: f64,
    /// Weight of positive (churn) samples relative to negatives
    pub scale_pos_weight: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 0.8,
            colsample_bytree: 0.8,
            scale_pos_weight: 3.0,
            random_state: Some(42),
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Gradient Boosting Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_log_odds: f64,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_log_odds: 0.0,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn validate_config(&self) -> Result<()> {
        let c = &self.config;
        let invalid = |name: &str, value: f64, reason: &str| ChurnError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };
        if !(c.learning_rate > 0.0) {
            return Err(invalid("learning_rate", c.learning_rate, "must be positive"));
        }
        if !(c.subsample > 0.0 && c.subsample <= 1.0) {
            return Err(invalid("subsample", c.subsample, "must be in (0, 1]"));
        }
        if !(c.colsample_bytree > 0.0 && c.colsample_bytree <= 1.0) {
            return Err(invalid("colsample_bytree", c.colsample_bytree, "must be in (0, 1]"));
        }
        if !(c.scale_pos_weight > 0.0) {
            return Err(invalid("scale_pos_weight", c.scale_pos_weight, "must be positive"));
        }
        Ok(())
    }

    fn sample_indices(n: usize, ratio: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let sample_size = (((n as f64) * ratio).ceil() as usize).clamp(1, n);
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(sample_size);
        indices.sort_unstable();
        indices
    }

    fn raw_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let mut log_odds = Array1::from_elem(x.nrows(), self.initial_log_odds);
        for tree in &self.trees {
            let update = tree.predict(x)?;
            log_odds.scaled_add(self.config.learning_rate, &update);
        }
        Ok(log_odds)
    }
}

impl Classifier for GradientBoostingClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_binary_targets(x, y)?;
        self.validate_config()?;

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        let weights = ClassWeight::PositiveScale(self.config.scale_pos_weight)
            .sample_weights(y)
            .to_vec();

        // Weighted base rate as the starting log odds
        let total_w: f64 = weights.iter().sum();
        let pos_w: f64 = weights.iter().zip(y.iter()).map(|(w, t)| w * t).sum();
        let p = (pos_w / total_w).clamp(1e-6, 1.0 - 1e-6);
        self.initial_log_odds = (p / (1.0 - p)).ln();

        let mut log_odds = Array1::from_elem(n_samples, self.initial_log_odds);
        let seed = self.config.random_state.unwrap_or(42);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

        self.trees.clear();
        self.feature_importances = vec![0.0; self.n_features];

        for round in 0..self.config.n_estimators {
            // Negative gradient of log loss
            let residuals: Array1<f64> = y
                .iter()
                .zip(log_odds.iter())
                .map(|(&yi, &lo)| yi - sigmoid(lo))
                .collect();

            let rows = Self::sample_indices(n_samples, self.config.subsample, &mut rng);
            let cols = Self::sample_indices(self.n_features, self.config.colsample_bytree, &mut rng);

            let mut tree = DecisionTree::new_regressor()
                .with_max_depth(Some(self.config.max_depth))
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_random_state(seed.wrapping_add(round as u64));
            tree.fit_subset(x, &residuals, &weights, rows, &cols)?;

            // Every row moves, sampled or not
            let update = tree.predict(x)?;
            log_odds.scaled_add(self.config.learning_rate, &update);

            if let Some(importance) = tree.feature_importances() {
                for (acc, &val) in self.feature_importances.iter_mut().zip(importance.iter()) {
                    *acc += val;
                }
            }
            self.trees.push(tree);
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= total;
            }
        }

        debug!(
            n_trees = self.trees.len(),
            initial_log_odds = self.initial_log_odds,
            "gradient boosting fitted"
        );
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.n_features == 0 {
            return Err(ChurnError::ModelNotFitted);
        }
        Ok(self.raw_scores(x)?.mapv(sigmoid))
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.feature_importances.is_empty() {
            None
        } else {
            Some(Array1::from_vec(self.feature_importances.clone()))
        }
    }
}
