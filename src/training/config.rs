//! Training configuration

use super::gradient_boosting::GradientBoostingConfig;
use crate::data::schema::CHURN;
use crate::error::ChurnError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classifier families trained by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Linear baseline
    LogisticRegression,
    /// Bagged tree ensemble
    RandomForest,
    /// Boosted tree ensemble
    GradientBoosting,
}

impl ModelType {
    /// Every family, in training order
    pub const ALL: [ModelType; 3] = [
        ModelType::LogisticRegression,
        ModelType::RandomForest,
        ModelType::GradientBoosting,
    ];

    /// Human-readable name, also the key in evaluation artifacts
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::LogisticRegression => "Logistic Regression",
            ModelType::RandomForest => "Random Forest",
            ModelType::GradientBoosting => "Gradient Boosting",
        }
    }

    /// File-name friendly form of the display name
    pub fn file_stem(&self) -> String {
        self.display_name().replace(' ', "_")
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelType {
    type Err = ChurnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "logistic" | "logistic_regression" | "lr" => Ok(ModelType::LogisticRegression),
            "random_forest" | "rf" | "forest" => Ok(ModelType::RandomForest),
            "gradient_boosting" | "gb" | "xgboost" | "boosting" => Ok(ModelType::GradientBoosting),
            other => Err(ChurnError::InvalidParameter {
                name: "model".to_string(),
                value: other.to_string(),
                reason: "expected logistic_regression, random_forest or gradient_boosting"
                    .to_string(),
            }),
        }
    }
}

/// Configuration for model training and selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Families to train, in order; ties in selection go to the earlier one
    pub models: Vec<ModelType>,

    /// Label column name
    pub target_column: String,

    /// Held-out fraction for evaluation and selection
    pub test_size: f64,

    /// Number of stratified cross-validation folds on the training partition (0 = no CV)
    pub cv_folds: usize,

    /// Random seed for reproducibility
    pub random_state: Option<u64>,

    /// Oversample the minority class with SMOTE instead of reweighting
    pub use_oversampling: bool,

    /// Neighbours used by SMOTE
    pub smote_k_neighbors: usize,

    /// Logistic regression iteration cap
    pub max_iter: usize,

    /// Trees in the random forest
    pub n_estimators: usize,

    /// Random forest tree depth
    pub max_depth: Option<usize>,

    /// Minimum samples per random forest leaf
    pub min_samples_leaf: usize,

    /// Boosted tree parameters
    pub gradient_boosting: GradientBoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            models: ModelType::ALL.to_vec(),
            target_column: CHURN.to_string(),
            test_size: 0.2,
            cv_folds: 0,
            random_state: Some(42),
            use_oversampling: false,
            smote_k_neighbors: 5,
            max_iter: 1000,
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_leaf: 1,
            gradient_boosting: GradientBoostingConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the trained families
    pub fn with_models(mut self, models: &[ModelType]) -> Self {
        self.models = models.to_vec();
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set CV folds
    pub fn with_cv(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builder method to switch from reweighting to SMOTE oversampling
    pub fn with_oversampling(mut self, enabled: bool) -> Self {
        self.use_oversampling = enabled;
        self
    }

    /// Builder method to set number of forest trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to set forest depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Builder method to set logistic regression iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Builder method to set boosting parameters
    pub fn with_gradient_boosting(mut self, config: GradientBoostingConfig) -> Self {
        self.gradient_boosting = config;
        self
    }

    /// Seed actually used by splits, trees and samplers
    pub fn seed(&self) -> u64 {
        self.random_state.unwrap_or(42)
    }

    /// Check ranges before any work starts
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.models.is_empty() {
            return Err(ChurnError::ConfigError("no model families selected".to_string()));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ChurnError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }
        if self.cv_folds == 1 {
            return Err(ChurnError::InvalidParameter {
                name: "cv_folds".to_string(),
                value: "1".to_string(),
                reason: "use 0 to disable or at least 2 folds".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_state, Some(42));
        assert_eq!(config.models, ModelType::ALL.to_vec());
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.max_depth, Some(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrainingConfig::new()
            .with_models(&[ModelType::RandomForest])
            .with_cv(3)
            .with_oversampling(true)
            .with_random_state(7);

        assert_eq!(config.models, vec![ModelType::RandomForest]);
        assert_eq!(config.cv_folds, 3);
        assert!(config.use_oversampling);
        assert_eq!(config.seed(), 7);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        assert!(TrainingConfig::new().with_test_size(1.0).validate().is_err());
        assert!(TrainingConfig::new().with_cv(1).validate().is_err());
        assert!(TrainingConfig::new().with_models(&[]).validate().is_err());
    }

    #[test]
    fn test_model_type_parse() {
        assert_eq!("random-forest".parse::<ModelType>().unwrap(), ModelType::RandomForest);
        assert_eq!("LR".parse::<ModelType>().unwrap(), ModelType::LogisticRegression);
        assert_eq!("xgboost".parse::<ModelType>().unwrap(), ModelType::GradientBoosting);
        assert!("svm".parse::<ModelType>().is_err());
        assert_eq!(ModelType::GradientBoosting.file_stem(), "Gradient_Boosting");
    }
}
