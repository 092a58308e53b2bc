//! Linear model implementations

use super::models::{check_binary_targets, ClassWeight, Classifier};
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Logistic regression for binary classification, fit by weighted gradient descent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Per-class sample weighting
    pub class_weight: ClassWeight,
    /// Iterations used by the last fit
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model with balanced class weights
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 1e-4,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            class_weight: ClassWeight::Balanced,
            n_iter: 0,
        }
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set class weighting
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_binary_targets(x, y)?;

        let n_features = x.ncols();
        let sample_weights = self.class_weight.sample_weights(y);
        let total_weight = sample_weights.sum();

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;
        let mut converged = false;
        self.n_iter = self.max_iter;

        for iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = (&predictions - y) * &sample_weights;
            let dw = x.t().dot(&errors) / total_weight + self.alpha * &weights;
            let db = errors.sum() / total_weight;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if !grad_norm.is_finite() {
                return Err(ChurnError::ConvergenceError { iterations: iter });
            }
            if grad_norm < self.tol {
                self.n_iter = iter;
                converged = true;
                break;
            }

            weights.scaled_add(-self.learning_rate, &dw);
            bias -= self.learning_rate * db;
        }

        if weights.iter().any(|w: &f64| !w.is_finite()) || !bias.is_finite() {
            return Err(ChurnError::ConvergenceError {
                iterations: self.n_iter,
            });
        }
        if converged {
            debug!(iterations = self.n_iter, "logistic regression converged");
        } else {
            warn!(
                max_iter = self.max_iter,
                "logistic regression did not converge; keeping last iterate"
            );
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (Some(coefficients), Some(intercept)) = (&self.coefficients, self.intercept) else {
            return Err(ChurnError::ModelNotFitted);
        };
        if x.ncols() != coefficients.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(Self::sigmoid(&(x.dot(coefficients) + intercept)))
    }

    /// Absolute coefficient magnitudes
    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.coefficients.as_ref().map(|c| c.mapv(f64::abs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_logistic_regression() {
        let x = array![[1.0, 1.0], [1.5, 1.5], [2.0, 2.0], [5.0, 5.0], [5.5, 5.5], [6.0, 6.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new().with_learning_rate(0.5);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        assert!(correct >= 5, "expected at least 5 correct, got {}", correct);
    }

    #[test]
    fn test_predict_proba_ordering() {
        let x = array![[0.0, 0.0], [10.0, 10.0]];
        let y = array![0.0, 1.0];

        let mut model = LogisticRegression::new().with_max_iter(500);
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] < 0.5);
        assert!(proba[1] > 0.5);
    }

    #[test]
    fn test_importances_are_absolute_coefficients() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]];
        let y = array![1.0, 0.0, 1.0, 0.0];

        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let coefs = model.coefficients.clone().unwrap();
        let importances = model.feature_importances().unwrap();
        assert!(coefs[0] < 0.0);
        assert_eq!(importances, coefs.mapv(f64::abs));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LogisticRegression::new();
        assert!(matches!(
            model.predict_proba(&array![[1.0]]),
            Err(ChurnError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_non_finite_input_fails_to_converge() {
        let x = array![[f64::NAN], [1.0]];
        let y = array![0.0, 1.0];
        let mut model = LogisticRegression::new();
        assert!(matches!(
            model.fit(&x, &y),
            Err(ChurnError::ConvergenceError { .. })
        ));
    }
}
