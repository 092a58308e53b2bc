//! Classifier trait, class weighting and the trained-model enum

use super::gradient_boosting::GradientBoostingClassifier;
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use super::ModelType;
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Binary classifier over an encoded feature matrix. Labels are 0.0 / 1.0.
pub trait Classifier: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of the positive (churn) class per row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Hard labels at a 0.5 threshold
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.predict_proba(x)?.mapv(|p| if p > 0.5 { 1.0 } else { 0.0 }))
    }

    /// Per-feature importance, if the model exposes one
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

/// Per-class sample weighting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample weighs 1
    Uniform,
    /// `n_samples / (2 * n_class)`, so both classes carry equal total weight
    Balanced,
    /// Positive samples weigh the given factor, negatives 1
    PositiveScale(f64),
}

impl ClassWeight {
    /// Per-sample weights for binary labels `y`
    pub fn sample_weights(&self, y: &Array1<f64>) -> Array1<f64> {
        match *self {
            ClassWeight::Uniform => Array1::ones(y.len()),
            ClassWeight::Balanced => {
                let n = y.len() as f64;
                let n_pos = y.iter().filter(|&&v| v > 0.5).count() as f64;
                let n_neg = n - n_pos;
                let w_pos = if n_pos > 0.0 { n / (2.0 * n_pos) } else { 1.0 };
                let w_neg = if n_neg > 0.0 { n / (2.0 * n_neg) } else { 1.0 };
                y.mapv(|v| if v > 0.5 { w_pos } else { w_neg })
            }
            ClassWeight::PositiveScale(scale) => y.mapv(|v| if v > 0.5 { scale } else { 1.0 }),
        }
    }
}

pub(crate) fn check_binary_targets(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ChurnError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(ChurnError::TrainingError("no training samples".to_string()));
    }
    if y.iter().any(|&v| v != 0.0 && v != 1.0) {
        return Err(ChurnError::TrainingError(
            "labels must be 0 or 1".to_string(),
        ));
    }
    Ok(())
}

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingClassifier),
}

impl TrainedModel {
    pub fn model_type(&self) -> ModelType {
        match self {
            TrainedModel::LogisticRegression(_) => ModelType::LogisticRegression,
            TrainedModel::RandomForest(_) => ModelType::RandomForest,
            TrainedModel::GradientBoosting(_) => ModelType::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            TrainedModel::LogisticRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
        }
    }
}

impl Classifier for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict_proba(x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.inner().feature_importances()
    }
}
