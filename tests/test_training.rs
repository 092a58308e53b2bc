//! Integration tests for training, comparison and selection

mod common;

use churn_sentinel::data::{clean, encode_labels};
use churn_sentinel::evaluation::EvaluationResult;
use churn_sentinel::feature_engineering::derive;
use churn_sentinel::preprocessing::PreprocessingConfig;
use churn_sentinel::training::{
    stratified_train_test_split, GradientBoostingConfig, ModelBundle, ModelType, TrainEngine,
    TrainingConfig,
};
use ndarray::Array1;
use polars::prelude::*;

fn prepared(n: usize, seed: u64) -> (DataFrame, Array1<f64>) {
    let cleaned = clean(&common::telco_frame(n, seed)).unwrap();
    let y = encode_labels(&cleaned, "Churn").unwrap();
    (derive(&cleaned).unwrap(), y)
}

fn quick_config() -> TrainingConfig {
    TrainingConfig::new()
        .with_n_estimators(20)
        .with_max_depth(6)
        .with_gradient_boosting(GradientBoostingConfig {
            n_estimators: 20,
            max_depth: 3,
            ..Default::default()
        })
}

fn metrics_of(outcome_metrics: &[(String, EvaluationResult)], name: &str) -> EvaluationResult {
    outcome_metrics
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, m)| *m)
        .unwrap()
}

#[test]
fn test_every_family_trains_and_beats_chance() {
    let (features, y) = prepared(400, 21);
    let engine = TrainEngine::new(quick_config(), PreprocessingConfig::default());
    let outcome = engine.train(&features, &y).unwrap();

    assert_eq!(outcome.bundles.len(), 3);
    assert!(outcome.evaluation.failed.is_empty());

    let metrics = outcome.metrics();
    for model_type in ModelType::ALL {
        let m = metrics_of(&metrics, model_type.display_name());
        assert!((0.0..=1.0).contains(&m.f1_score));
        assert!(m.roc_auc > 0.6, "{} auc {}", model_type, m.roc_auc);
    }

    // the selected model carries the highest held-out F1
    let best = outcome.best_bundle().unwrap();
    let best_f1 = metrics_of(&metrics, best.model_name()).f1_score;
    assert!(metrics.iter().all(|(_, m)| m.f1_score <= best_f1));
}

#[test]
fn test_training_is_reproducible() {
    let (features, y) = prepared(250, 8);
    let engine = TrainEngine::new(quick_config(), PreprocessingConfig::default());

    let first = engine.train(&features, &y).unwrap();
    let second = engine.train(&features, &y).unwrap();

    assert_eq!(first.metrics(), second.metrics());
    assert_eq!(first.evaluation.best_model, second.evaluation.best_model);

    let p1 = first.best_bundle().unwrap().predict_proba(&features).unwrap();
    let p2 = second.best_bundle().unwrap().predict_proba(&features).unwrap();
    assert_eq!(p1, p2);
}

#[test]
fn test_split_is_stratified() {
    let (_, y) = prepared(300, 13);
    let split = stratified_train_test_split(&y, 0.2, 42).unwrap();

    let n_test = split.test_indices.len() as f64;
    assert!((n_test / y.len() as f64 - 0.2).abs() < 0.02);

    let rate = |idx: &[usize]| idx.iter().map(|&i| y[i]).sum::<f64>() / idx.len() as f64;
    assert!((rate(&split.train_indices) - rate(&split.test_indices)).abs() < 0.05);

    let mut all: Vec<usize> = split.train_indices.clone();
    all.extend(&split.test_indices);
    all.sort_unstable();
    assert_eq!(all, (0..y.len()).collect::<Vec<_>>());
}

#[test]
fn test_oversampling_only_touches_training_rows() {
    let (features, y) = prepared(300, 17);
    let config = quick_config()
        .with_models(&[ModelType::RandomForest])
        .with_oversampling(true);
    let outcome = TrainEngine::new(config, PreprocessingConfig::default())
        .train(&features, &y)
        .unwrap();

    let split = stratified_train_test_split(&y, 0.2, 42).unwrap();
    let train_y: Vec<f64> = split.train_indices.iter().map(|&i| y[i]).collect();
    let positives = train_y.iter().filter(|&&v| v > 0.5).count();
    let negatives = train_y.len() - positives;

    let meta = outcome.bundles[0].metadata();
    assert_eq!(meta.n_synthetic_rows, negatives.abs_diff(positives));
    assert_eq!(meta.n_training_rows, train_y.len() + meta.n_synthetic_rows);

    let eval = &outcome.evaluation.models[0];
    assert_eq!(eval.confusion_matrix.total(), split.test_indices.len());
}

#[test]
fn test_cross_validation_reports_per_family() {
    let (features, y) = prepared(200, 31);
    let config = quick_config()
        .with_models(&[ModelType::LogisticRegression, ModelType::GradientBoosting])
        .with_cv(3);
    let outcome = TrainEngine::new(config, PreprocessingConfig::default())
        .train(&features, &y)
        .unwrap();

    for eval in &outcome.evaluation.models {
        let cv = eval.cross_validation.as_ref().unwrap();
        assert_eq!(cv.n_folds, 3);
        assert_eq!(cv.scores.len(), 3);
        assert!(cv.std_score >= 0.0);
    }
}

#[test]
fn test_single_family_bundle_predicts_in_range() {
    let (features, y) = prepared(150, 2);
    let bundle = ModelBundle::fit(
        ModelType::GradientBoosting,
        &features,
        &y,
        &PreprocessingConfig::default(),
        &quick_config(),
    )
    .unwrap();

    let labels = bundle.predict(&features, 0.5).unwrap();
    assert!(labels.iter().all(|&l| l == 0.0 || l == 1.0));
    let importances = bundle.feature_importances().unwrap();
    assert_eq!(importances.len(), bundle.transform().n_features());
}

#[test]
fn test_invalid_config_rejected() {
    let (features, y) = prepared(60, 1);
    let engine = TrainEngine::new(
        quick_config().with_test_size(1.5),
        PreprocessingConfig::default(),
    );
    assert!(engine.train(&features, &y).is_err());
}
