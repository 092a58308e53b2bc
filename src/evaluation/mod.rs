//! Model evaluation
//!
//! Held-out metrics per model, the persisted evaluation artifact and the
//! text/CSV reports written after training.

pub mod metrics;
mod report;

pub use metrics::{
    classification_report, roc_auc, roc_curve, ConfusionMatrix, EvaluationResult, RocPoint,
};
pub use report::{
    write_reports, ComparisonRow, EvaluationArtifact, FailedModel, ModelEvaluation,
};

#[cfg(test)]
pub(crate) use report::fixtures;

use crate::error::Result;
use ndarray::Array1;

/// Score one model's held-out churn probabilities
pub fn evaluate(
    model_name: &str,
    y_true: &Array1<f64>,
    y_proba: &Array1<f64>,
    threshold: f64,
) -> Result<ModelEvaluation> {
    let metrics = EvaluationResult::compute(y_true, y_proba, threshold)?;
    let y_pred = y_proba.mapv(|p| if p > threshold { 1.0 } else { 0.0 });

    Ok(ModelEvaluation {
        model_name: model_name.to_string(),
        metrics,
        confusion_matrix: ConfusionMatrix::from_predictions(y_true, &y_pred),
        roc_curve: roc_curve(y_true, y_proba),
        classification_report: classification_report(y_true, &y_pred),
        cross_validation: None,
        training_time_secs: 0.0,
    })
}
