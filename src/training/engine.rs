//! Training engine: split, fit every family, evaluate, select

use super::bundle::ModelBundle;
use super::cross_validation::{stratified_train_test_split, CVResults, StratifiedKFold};
use super::{ModelType, TrainingConfig};
use crate::error::{ChurnError, Result};
use crate::evaluation::{self, EvaluationArtifact, EvaluationResult, FailedModel, ModelEvaluation};
use crate::preprocessing::PreprocessingConfig;
use chrono::Utc;
use ndarray::{Array1, Axis};
use polars::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

/// Threshold used for held-out metrics and selection
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Rows of `df` at `indices`, in the given order
pub(crate) fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

/// Name of the evaluation with the highest F1; the earliest wins ties
pub fn select_best(evaluations: &[ModelEvaluation]) -> Option<&ModelEvaluation> {
    let mut best: Option<&ModelEvaluation> = None;
    for eval in evaluations {
        if best.map_or(true, |b| eval.metrics.f1_score > b.metrics.f1_score) {
            best = Some(eval);
        }
    }
    best
}

/// Bundles and evaluations of one training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Successfully trained bundles, in training order
    pub bundles: Vec<ModelBundle>,
    pub evaluation: EvaluationArtifact,
}

impl TrainingOutcome {
    /// Bundle chosen by held-out F1
    pub fn best_bundle(&self) -> Result<&ModelBundle> {
        self.bundles
            .iter()
            .find(|b| b.model_name() == self.evaluation.best_model)
            .ok_or_else(|| {
                ChurnError::TrainingError(format!(
                    "selected model {} has no bundle",
                    self.evaluation.best_model
                ))
            })
    }

    /// Held-out metrics keyed by model name, in training order
    pub fn metrics(&self) -> Vec<(String, EvaluationResult)> {
        self.evaluation
            .models
            .iter()
            .map(|m| (m.model_name.clone(), m.metrics))
            .collect()
    }
}

/// Trains each configured family on the same stratified split
#[derive(Debug, Clone)]
pub struct TrainEngine {
    training: TrainingConfig,
    preprocessing: PreprocessingConfig,
}

impl TrainEngine {
    /// Create a new training engine
    pub fn new(training: TrainingConfig, preprocessing: PreprocessingConfig) -> Self {
        Self {
            training,
            preprocessing,
        }
    }

    pub fn training_config(&self) -> &TrainingConfig {
        &self.training
    }

    /// Train, evaluate and select over an engineered table and its labels
    pub fn train(&self, features: &DataFrame, labels: &Array1<f64>) -> Result<TrainingOutcome> {
        self.training.validate()?;
        if features.height() != labels.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", features.height()),
                actual: format!("{} labels", labels.len()),
            });
        }

        let split =
            stratified_train_test_split(labels, self.training.test_size, self.training.seed())?;
        let train_df = take_rows(features, &split.train_indices)?;
        let test_df = take_rows(features, &split.test_indices)?;
        let y_train = labels.select(Axis(0), &split.train_indices);
        let y_test = labels.select(Axis(0), &split.test_indices);

        info!(
            train_rows = train_df.height(),
            test_rows = test_df.height(),
            churn_rate = y_train.mean().unwrap_or(0.0),
            "split data"
        );

        let mut bundles = Vec::new();
        let mut evaluations = Vec::new();
        let mut failed = Vec::new();

        for &model_type in &self.training.models {
            match self.train_family(model_type, &train_df, &y_train, &test_df, &y_test) {
                Ok((bundle, eval)) => {
                    info!(
                        model = %model_type,
                        f1 = eval.metrics.f1_score,
                        roc_auc = eval.metrics.roc_auc,
                        secs = eval.training_time_secs,
                        "trained model"
                    );
                    bundles.push(bundle);
                    evaluations.push(eval);
                }
                Err(e) => {
                    warn!(model = %model_type, error = %e, "model training failed");
                    failed.push(FailedModel {
                        model_name: model_type.display_name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let best_model = select_best(&evaluations)
            .map(|e| e.model_name.clone())
            .ok_or_else(|| ChurnError::TrainingError("every model family failed".to_string()))?;
        info!(model = %best_model, "selected best model");

        Ok(TrainingOutcome {
            bundles,
            evaluation: EvaluationArtifact {
                best_model,
                models: evaluations,
                failed,
                generated_at: Utc::now(),
            },
        })
    }

    fn train_family(
        &self,
        model_type: ModelType,
        train_df: &DataFrame,
        y_train: &Array1<f64>,
        test_df: &DataFrame,
        y_test: &Array1<f64>,
    ) -> Result<(ModelBundle, ModelEvaluation)> {
        let start = Instant::now();

        let cross_validation = if self.training.cv_folds >= 2 {
            Some(self.cross_validate(model_type, train_df, y_train)?)
        } else {
            None
        };

        let bundle =
            ModelBundle::fit(model_type, train_df, y_train, &self.preprocessing, &self.training)?;
        let proba = bundle.predict_proba(test_df)?;

        let mut eval =
            evaluation::evaluate(model_type.display_name(), y_test, &proba, DECISION_THRESHOLD)?;
        eval.cross_validation = cross_validation;
        eval.training_time_secs = start.elapsed().as_secs_f64();
        Ok((bundle, eval))
    }

    /// F1 per stratified fold of the training partition; each fold fits its own transform
    pub fn cross_validate(
        &self,
        model_type: ModelType,
        df: &DataFrame,
        y: &Array1<f64>,
    ) -> Result<CVResults> {
        let splits = StratifiedKFold::new(self.training.cv_folds)
            .with_random_state(self.training.seed())
            .split(y)?;

        let mut scores = Vec::with_capacity(splits.len());
        for split in &splits {
            let fold_train = take_rows(df, &split.train_indices)?;
            let fold_test = take_rows(df, &split.test_indices)?;
            let y_fold_train = y.select(Axis(0), &split.train_indices);
            let y_fold_test = y.select(Axis(0), &split.test_indices);

            let bundle = ModelBundle::fit(
                model_type,
                &fold_train,
                &y_fold_train,
                &self.preprocessing,
                &self.training,
            )?;
            let proba = bundle.predict_proba(&fold_test)?;
            let metrics = EvaluationResult::compute(&y_fold_test, &proba, DECISION_THRESHOLD)?;
            scores.push(metrics.f1_score);
        }

        let results = CVResults::from_scores(scores);
        info!(
            model = %model_type,
            folds = results.n_folds,
            mean_f1 = results.mean_score,
            std_f1 = results.std_score,
            "cross-validated"
        );
        Ok(results)
    }
}
