//! Churn scoring over a trained bundle
//!
//! Raw customer rows go through the same row-wise normalization and feature
//! derivation used at training time, then the bundle's frozen transform and
//! classifier. Large tables are scored in row chunks on the rayon pool;
//! chunks are reassembled in input order.

use super::InferenceConfig;
use crate::data::{normalize_types, require_columns, CustomerRecord, REQUIRED_BASE_COLUMNS};
use crate::error::{ChurnError, Result};
use crate::feature_engineering::derive;
use crate::training::ModelBundle;
use ndarray::Array1;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Appended to batch output
pub const PREDICTION_COLUMN: &str = "Churn_Prediction";
pub const PROBABILITY_COLUMN: &str = "Churn_Probability";
pub const NO_CHURN_PROBABILITY_COLUMN: &str = "No_Churn_Probability";

/// Outcome of scoring one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// `Churn` or `No Churn` (configurable)
    pub label: String,
    /// 1 when the label is the churn label
    pub prediction: u8,
    pub churn_probability: f64,
    pub no_churn_probability: f64,
}

/// Scores customers with one shared, immutable bundle
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ModelBundle>,
    config: InferenceConfig,
}

impl Predictor {
    pub fn new(bundle: Arc<ModelBundle>, config: InferenceConfig) -> Self {
        Self { bundle, config }
    }

    /// Load the bundle from disk
    pub fn from_path(path: &Path, config: InferenceConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(ModelBundle::load(path)?), config))
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Churn probability per row of a raw customer table
    pub fn score(&self, df: &DataFrame) -> Result<Array1<f64>> {
        require_columns(df, &REQUIRED_BASE_COLUMNS)?;
        let normalized = normalize_types(df)?;
        let features = derive(&normalized)?;

        let n_rows = features.height();
        let batch_size = self.config.batch_size.max(1);
        if n_rows <= batch_size {
            return self.bundle.predict_proba(&features);
        }

        let chunks: Vec<DataFrame> = (0..n_rows)
            .step_by(batch_size)
            .map(|start| features.slice(start as i64, batch_size.min(n_rows - start)))
            .collect();

        let scored: Vec<Array1<f64>> = if self.config.parallel {
            chunks
                .par_iter()
                .map(|chunk| self.bundle.predict_proba(chunk))
                .collect::<Result<Vec<_>>>()?
        } else {
            chunks
                .iter()
                .map(|chunk| self.bundle.predict_proba(chunk))
                .collect::<Result<Vec<_>>>()?
        };

        debug!(n_rows, n_chunks = chunks.len(), "scored in chunks");
        Ok(scored.into_iter().flatten().collect())
    }

    /// Score one fully specified customer
    pub fn predict_one(&self, record: &CustomerRecord) -> Result<PredictionResult> {
        let df = record.to_frame()?;
        let probability = self
            .score(&df)?
            .first()
            .copied()
            .ok_or_else(|| ChurnError::InferenceError("no score produced".to_string()))?;
        Ok(self.result_for(probability))
    }

    /// Input table with prediction and probability columns appended, rows in input order
    pub fn predict_many(&self, df: &DataFrame) -> Result<DataFrame> {
        let start = Instant::now();
        let proba = self.score(df)?;

        let labels: Vec<&str> = proba.iter().map(|&p| self.config.label_for(p)).collect();
        let no_churn: Vec<f64> = proba.iter().map(|&p| 1.0 - p).collect();

        let mut result = df.clone();
        result.with_column(Series::new(PREDICTION_COLUMN.into(), labels))?;
        result.with_column(Series::new(PROBABILITY_COLUMN.into(), proba.to_vec()))?;
        result.with_column(Series::new(NO_CHURN_PROBABILITY_COLUMN.into(), no_churn))?;

        debug!(
            rows = result.height(),
            ms = start.elapsed().as_secs_f64() * 1000.0,
            "batch prediction"
        );
        Ok(result)
    }

    fn result_for(&self, probability: f64) -> PredictionResult {
        let label = self.config.label_for(probability).to_string();
        PredictionResult {
            prediction: u8::from(self.config.is_churn(probability)),
            label,
            churn_probability: probability,
            no_churn_probability: 1.0 - probability,
        }
    }
}

/// Score one customer with default inference settings
pub fn predict_one(bundle: Arc<ModelBundle>, record: &CustomerRecord) -> Result<PredictionResult> {
    Predictor::new(bundle, InferenceConfig::default()).predict_one(record)
}

/// Score a customer table with default inference settings
pub fn predict_many(bundle: Arc<ModelBundle>, df: &DataFrame) -> Result<DataFrame> {
    Predictor::new(bundle, InferenceConfig::default()).predict_many(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::fixtures::month_to_month_customer;
    use crate::preprocessing::PreprocessingConfig;
    use crate::training::{GradientBoostingConfig, ModelType, TrainingConfig};
    use ndarray::array;

    fn customers() -> DataFrame {
        df!(
            "customerID" => &["a", "b", "c", "d", "e", "f"],
            "gender" => &["Female", "Male", "Female", "Male", "Female", "Male"],
            "SeniorCitizen" => &[0i64, 1, 0, 0, 1, 0],
            "Partner" => &["Yes", "No", "No", "Yes", "No", "Yes"],
            "Dependents" => &["No", "No", "Yes", "Yes", "No", "No"],
            "tenure" => &[1i64, 3, 60, 70, 2, 45],
            "PhoneService" => &["Yes", "Yes", "Yes", "No", "Yes", "Yes"],
            "MultipleLines" => &["No", "Yes", "Yes", "No phone service", "No", "Yes"],
            "InternetService" => &["Fiber optic", "Fiber optic", "DSL", "DSL", "Fiber optic", "No"],
            "OnlineSecurity" => &["No", "No", "Yes", "Yes", "No", "No internet service"],
            "OnlineBackup" => &["No", "Yes", "Yes", "No", "No", "No internet service"],
            "DeviceProtection" => &["No", "No", "Yes", "Yes", "No", "No internet service"],
            "TechSupport" => &["No", "No", "Yes", "Yes", "No", "No internet service"],
            "StreamingTV" => &["Yes", "Yes", "No", "Yes", "No", "No internet service"],
            "StreamingMovies" => &["No", "Yes", "No", "Yes", "No", "No internet service"],
            "Contract" => &["Month-to-month", "Month-to-month", "Two year", "Two year",
                            "Month-to-month", "One year"],
            "PaperlessBilling" => &["Yes", "Yes", "No", "No", "Yes", "No"],
            "PaymentMethod" => &["Electronic check", "Electronic check", "Bank transfer (automatic)",
                                 "Credit card (automatic)", "Mailed check", "Mailed check"],
            "MonthlyCharges" => &[85.0, 95.5, 60.0, 55.0, 75.0, 20.0],
            "TotalCharges" => &["85.0", "290.1", "3600.0", "3850", " ", "900.0"],
            "Churn" => &["Yes", "Yes", "No", "No", "Yes", "No"]
        )
        .unwrap()
    }

    fn bundle() -> Arc<ModelBundle> {
        let df = customers();
        let features = derive(&normalize_types(&df).unwrap()).unwrap();
        let y = array![1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let training = TrainingConfig::new().with_gradient_boosting(GradientBoostingConfig {
            n_estimators: 10,
            max_depth: 3,
            ..Default::default()
        });
        Arc::new(
            ModelBundle::fit(
                ModelType::LogisticRegression,
                &features,
                &y,
                &PreprocessingConfig::default(),
                &training,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_predict_many_appends_columns() {
        let df = customers();
        let out = predict_many(bundle(), &df).unwrap();

        assert_eq!(out.height(), df.height());
        assert_eq!(out.width(), df.width() + 3);
        assert!(out.column("Churn").is_ok());
        assert!(out.column("customerID").is_ok());

        let proba = out.column(PROBABILITY_COLUMN).unwrap().f64().unwrap();
        let labels = out.column(PREDICTION_COLUMN).unwrap().str().unwrap();
        for (p, label) in proba.into_iter().zip(labels.into_iter()) {
            let (p, label) = (p.unwrap(), label.unwrap());
            assert!((0.0..=1.0).contains(&p));
            assert_eq!(label, if p > 0.5 { "Churn" } else { "No Churn" });
        }
    }

    #[test]
    fn test_chunked_scoring_matches_single_pass() {
        let bundle = bundle();
        let df = customers();
        let whole = Predictor::new(bundle.clone(), InferenceConfig::default())
            .score(&df)
            .unwrap();
        let chunked = Predictor::new(bundle, InferenceConfig::new().with_batch_size(4))
            .score(&df)
            .unwrap();
        assert_eq!(whole, chunked);
    }

    #[test]
    fn test_predict_one_matches_predict_many() {
        let bundle = bundle();
        let record = month_to_month_customer();
        let single = predict_one(bundle.clone(), &record).unwrap();
        let batch = predict_many(bundle, &record.to_frame().unwrap()).unwrap();

        let batch_p = batch.column(PROBABILITY_COLUMN).unwrap().f64().unwrap().get(0);
        assert_eq!(batch_p, Some(single.churn_probability));
        assert!((single.churn_probability + single.no_churn_probability - 1.0).abs() < 1e-12);
        assert_eq!(single.prediction == 1, single.label == "Churn");
    }

    #[test]
    fn test_missing_column_rejected_before_scoring() {
        let df = customers().drop("Contract").unwrap();
        match predict_many(bundle(), &df) {
            Err(ChurnError::MissingField(name)) => assert_eq!(name, "Contract"),
            other => panic!("expected missing field, got {:?}", other.map(|d| d.shape())),
        }
    }

    #[test]
    fn test_unseen_category_still_scores() {
        let mut record = month_to_month_customer();
        record.payment_method = "Crypto".to_string();
        let result = predict_one(bundle(), &record).unwrap();
        assert!((0.0..=1.0).contains(&result.churn_probability));
    }
}
