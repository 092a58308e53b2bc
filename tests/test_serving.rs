//! Integration test: prediction service over a trained bundle
//! Tests: fit → save → load → predict_one / predict_many → registry

mod common;

use churn_sentinel::config::PathsConfig;
use churn_sentinel::data::{clean, encode_labels};
use churn_sentinel::error::ChurnError;
use churn_sentinel::feature_engineering::derive;
use churn_sentinel::inference::{
    predict_many, predict_one, ArtifactRegistry, InferenceConfig, Predictor,
    NO_CHURN_PROBABILITY_COLUMN, PREDICTION_COLUMN, PROBABILITY_COLUMN,
};
use churn_sentinel::preprocessing::PreprocessingConfig;
use churn_sentinel::training::{ModelBundle, ModelType, TrainingConfig};
use polars::prelude::*;
use std::sync::Arc;
use tempfile::tempdir;

fn trained(model_type: ModelType) -> Arc<ModelBundle> {
    let cleaned = clean(&common::telco_frame(200, 42)).unwrap();
    let y = encode_labels(&cleaned, "Churn").unwrap();
    let features = derive(&cleaned).unwrap();
    let config = TrainingConfig::new().with_n_estimators(15).with_max_depth(5);
    Arc::new(
        ModelBundle::fit(
            model_type,
            &features,
            &y,
            &PreprocessingConfig::default(),
            &config,
        )
        .unwrap(),
    )
}

fn probability_column(df: &DataFrame) -> Vec<f64> {
    df.column(PROBABILITY_COLUMN)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect()
}

// ============================================================================
// predict_one / predict_many
// ============================================================================

#[test]
fn test_single_and_batch_agree() {
    for model_type in ModelType::ALL {
        let bundle = trained(model_type);
        let record = common::customer();

        let single = predict_one(bundle.clone(), &record).unwrap();
        let batch = predict_many(bundle, &record.to_frame().unwrap()).unwrap();

        assert_eq!(probability_column(&batch), vec![single.churn_probability]);
        let label = batch.column(PREDICTION_COLUMN).unwrap().str().unwrap().get(0);
        assert_eq!(label, Some(single.label.as_str()));
    }
}

#[test]
fn test_predict_one_is_deterministic() {
    let bundle = trained(ModelType::RandomForest);
    let record = common::customer();
    let first = predict_one(bundle.clone(), &record).unwrap();
    let second = predict_one(bundle, &record).unwrap();
    assert_eq!(first, second);
    assert!(["Churn", "No Churn"].contains(&first.label.as_str()));
    assert!((0.0..=1.0).contains(&first.churn_probability));
}

#[test]
fn test_batch_keeps_rows_and_label_column() {
    let bundle = trained(ModelType::LogisticRegression);
    let raw = common::telco_frame(37, 5);
    let scored = predict_many(bundle, &raw).unwrap();

    assert_eq!(scored.height(), raw.height());
    assert_eq!(scored.width(), raw.width() + 3);

    for name in ["customerID", "Churn"] {
        let before = raw.column(name).unwrap().as_materialized_series();
        let after = scored.column(name).unwrap().as_materialized_series();
        assert!(before.equals(after), "{} changed", name);
    }

    let churn_p = probability_column(&scored);
    let stay_p: Vec<f64> = scored
        .column(NO_CHURN_PROBABILITY_COLUMN)
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    for (c, s) in churn_p.iter().zip(stay_p.iter()) {
        assert!((c + s - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_batch_scores_independent_of_label_column() {
    let bundle = trained(ModelType::GradientBoosting);
    let raw = common::telco_frame(20, 9);
    let without_label = raw.drop("Churn").unwrap();

    let with = probability_column(&predict_many(bundle.clone(), &raw).unwrap());
    let without = probability_column(&predict_many(bundle, &without_label).unwrap());
    assert_eq!(with, without);
}

#[test]
fn test_missing_base_column_is_schema_error() {
    let bundle = trained(ModelType::LogisticRegression);
    let raw = common::telco_frame(5, 1).drop("MonthlyCharges").unwrap();
    match predict_many(bundle, &raw) {
        Err(ChurnError::MissingField(name)) => assert_eq!(name, "MonthlyCharges"),
        other => panic!("expected missing field, got {:?}", other.map(|d| d.shape())),
    }
}

#[test]
fn test_threshold_controls_label() {
    let bundle = trained(ModelType::LogisticRegression);
    let record = common::customer();

    let always = Predictor::new(bundle.clone(), InferenceConfig::new().with_threshold(0.0));
    let never = Predictor::new(bundle, InferenceConfig::new().with_threshold(1.01));
    assert_eq!(always.predict_one(&record).unwrap().label, "Churn");
    assert_eq!(never.predict_one(&record).unwrap().label, "No Churn");
}

#[test]
fn test_unseen_category_scores() {
    let bundle = trained(ModelType::RandomForest);
    let mut record = common::customer();
    record.payment_method = "Gift card".to_string();
    assert!(record.validate().is_err());
    let result = predict_one(bundle, &record).unwrap();
    assert!((0.0..=1.0).contains(&result.churn_probability));
}

// ============================================================================
// Persistence and registry
// ============================================================================

#[test]
fn test_saved_bundle_reproduces_predictions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("models/model.json");
    let record = common::customer();

    for model_type in ModelType::ALL {
        let bundle = trained(model_type);
        bundle.save(&path).unwrap();
        let loaded = Arc::new(ModelBundle::load(&path).unwrap());

        assert_eq!(
            predict_one(bundle, &record).unwrap(),
            predict_one(loaded, &record).unwrap(),
            "{} differs after reload",
            model_type
        );
    }
}

#[test]
fn test_registry_serves_and_reloads_model() {
    let dir = tempdir().unwrap();
    let paths = PathsConfig {
        raw_data: dir.path().join("raw.csv"),
        processed_data: dir.path().join("processed.csv"),
        model_dir: dir.path().join("models"),
        reports_dir: dir.path().join("reports"),
    };
    let registry = ArtifactRegistry::new(paths.clone());
    assert!(registry.model().unwrap_err().is_missing_resource());

    trained(ModelType::LogisticRegression)
        .save(&paths.model_path())
        .unwrap();
    let first = registry.model().unwrap();
    assert_eq!(first.model_name(), "Logistic Regression");
    assert!(Arc::ptr_eq(&first, &registry.model().unwrap()));

    trained(ModelType::RandomForest).save(&paths.model_path()).unwrap();
    // still the cached copy until invalidated
    assert_eq!(registry.model().unwrap().model_name(), "Logistic Regression");

    // reload needs the evaluation artifact too
    assert!(registry.reload().is_err());
    assert_eq!(registry.model().unwrap().model_name(), "Random Forest");
}

#[test]
fn test_registry_dataset_falls_back_to_raw() {
    let dir = tempdir().unwrap();
    let paths = PathsConfig {
        raw_data: dir.path().join("raw.csv"),
        processed_data: dir.path().join("missing_processed.csv"),
        model_dir: dir.path().join("models"),
        reports_dir: dir.path().join("reports"),
    };
    common::write_csv(&common::telco_frame(30, 3), &paths.raw_data);

    let registry = ArtifactRegistry::new(paths);
    let dataset = registry.dataset().unwrap();
    assert_eq!(dataset.height(), 30);
    assert!(dataset.column("customerID").is_err());
}
