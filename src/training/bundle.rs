//! Model bundle: the fitted feature transform paired with its classifier

use super::gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
use super::linear_models::LogisticRegression;
use super::models::{ClassWeight, Classifier, TrainedModel};
use super::random_forest::RandomForest;
use super::{ModelType, TrainingConfig};
use crate::error::{ChurnError, Result};
use crate::preprocessing::{FeatureTransform, PreprocessingConfig};
use crate::synthetic::{Sampler, SMOTE};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Provenance of a fitted bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub trained_at: DateTime<Utc>,
    /// Rows the classifier saw, synthetic rows included
    pub n_training_rows: usize,
    pub n_synthetic_rows: usize,
    pub crate_version: String,
}

/// Unfitted classifier for a family. With oversampling the classes are
/// already balanced, so class reweighting is switched off.
pub fn build_classifier(model_type: ModelType, config: &TrainingConfig) -> TrainedModel {
    let seed = config.seed();
    let weight = if config.use_oversampling {
        ClassWeight::Uniform
    } else {
        ClassWeight::Balanced
    };

    match model_type {
        ModelType::LogisticRegression => TrainedModel::LogisticRegression(
            LogisticRegression::new()
                .with_max_iter(config.max_iter)
                .with_class_weight(weight),
        ),
        ModelType::RandomForest => TrainedModel::RandomForest(
            RandomForest::new(config.n_estimators)
                .with_max_depth(config.max_depth)
                .with_min_samples_leaf(config.min_samples_leaf)
                .with_class_weight(weight)
                .with_random_state(seed),
        ),
        ModelType::GradientBoosting => {
            let mut gb = GradientBoostingConfig {
                random_state: Some(seed),
                ..config.gradient_boosting.clone()
            };
            if config.use_oversampling {
                gb.scale_pos_weight = 1.0;
            }
            TrainedModel::GradientBoosting(GradientBoostingClassifier::new(gb))
        }
    }
}

/// A trained, self-contained predictor over engineered feature tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    model_name: String,
    transform: FeatureTransform,
    classifier: TrainedModel,
    metadata: BundleMetadata,
}

impl ModelBundle {
    /// Fit a transform on `df` and a classifier of `model_type` on the encoded rows
    pub fn fit(
        model_type: ModelType,
        df: &DataFrame,
        y: &Array1<f64>,
        preprocessing: &PreprocessingConfig,
        training: &TrainingConfig,
    ) -> Result<Self> {
        if df.height() != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} labels", df.height()),
                actual: format!("{} labels", y.len()),
            });
        }

        let transform = FeatureTransform::fit(df, preprocessing)?;
        let mut x = transform.apply(df)?;
        let mut y = y.clone();

        let mut n_synthetic_rows = 0;
        if training.use_oversampling {
            let mut smote = SMOTE::new()
                .with_k_neighbors(training.smote_k_neighbors)
                .with_seed(training.seed());
            let resampled = smote.fit_resample(&x, &y)?;
            n_synthetic_rows = resampled.n_synthetic;
            x = resampled.x;
            y = resampled.y;
            debug!(n_synthetic = n_synthetic_rows, "oversampled minority class");
        }

        let mut classifier = build_classifier(model_type, training);
        classifier.fit(&x, &y)?;

        Ok(Self {
            model_name: model_type.display_name().to_string(),
            transform,
            classifier,
            metadata: BundleMetadata {
                trained_at: Utc::now(),
                n_training_rows: x.nrows(),
                n_synthetic_rows,
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        })
    }

    /// Encode an engineered table with the frozen transform
    pub fn apply(&self, df: &DataFrame) -> Result<Array2<f64>> {
        self.transform.apply(df)
    }

    /// Churn probability per row
    pub fn predict_proba(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.apply(df)?;
        self.classifier.predict_proba(&x)
    }

    /// Hard 0/1 labels at `threshold`
    pub fn predict(&self, df: &DataFrame, threshold: f64) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(df)?
            .mapv(|p| if p > threshold { 1.0 } else { 0.0 }))
    }

    /// Importances named by encoded feature, largest first
    pub fn feature_importances(&self) -> Option<Vec<(String, f64)>> {
        let importances = self.classifier.feature_importances()?;
        let mut named: Vec<(String, f64)> = self
            .transform
            .feature_names()
            .iter()
            .cloned()
            .zip(importances.iter().copied())
            .collect();
        named.sort_by(|a, b| b.1.total_cmp(&a.1));
        Some(named)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_type(&self) -> ModelType {
        self.classifier.model_type()
    }

    pub fn transform(&self) -> &FeatureTransform {
        &self.transform
    }

    pub fn classifier(&self) -> &TrainedModel {
        &self.classifier
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    /// Persist as a single JSON document
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), model = %self.model_name, "saved model bundle");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChurnError::missing_artifact("Model", path));
        }
        let json = fs::read_to_string(path)?;
        let bundle: Self = serde_json::from_str(&json)?;
        debug!(path = %path.display(), model = %bundle.model_name, "loaded model bundle");
        Ok(bundle)
    }
}
