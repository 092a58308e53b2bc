//! Churn Sentinel - customer churn prediction pipeline
//!
//! This crate provides an end-to-end churn workflow:
//! - Data cleaning and schema checks for Telco-style customer tables
//! - Row-wise feature derivation shared by training and scoring
//! - A fitted, persisted feature transform (scaling + one-hot encoding)
//! - Logistic regression, random forest and gradient boosting classifiers,
//!   compared on a stratified hold-out and selected by F1
//! - Single-record and batch prediction over a trained bundle
//!
//! # Modules
//!
//! ## Pipeline stages
//! - [`data`] - Schema, cleaning and type normalization
//! - [`feature_engineering`] - Derived churn features
//! - [`preprocessing`] - The fitted feature transform
//! - [`synthetic`] - SMOTE minority oversampling
//! - [`training`] - Classifiers, splits, engine and model bundle
//! - [`evaluation`] - Metrics, comparison and report files
//! - [`inference`] - Prediction service and artifact registry
//!
//! ## Glue
//! - [`config`] - Aggregated configuration and file locations
//! - [`cli`] - Command-line interface
//! - [`utils`] - CSV loading and saving

// Core error handling
pub mod error;

// Pipeline stages
pub mod data;
pub mod feature_engineering;
pub mod preprocessing;
pub mod synthetic;
pub mod training;
pub mod evaluation;
pub mod inference;

// Configuration and services
pub mod config;
pub mod cli;
pub mod utils;

pub use error::{ChurnError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ChurnError, Result};

    // Configuration
    pub use crate::config::{ChurnConfig, PathsConfig};

    // Data
    pub use crate::data::{clean, encode_labels, normalize_types, CustomerRecord};

    // Feature engineering
    pub use crate::feature_engineering::{derive, TenureGroup};

    // Preprocessing
    pub use crate::preprocessing::{FeatureTransform, PreprocessingConfig};

    // Training
    pub use crate::training::{
        select_best, train_full_pipeline, ModelBundle, ModelType, TrainEngine, TrainingConfig,
    };

    // Evaluation
    pub use crate::evaluation::{EvaluationArtifact, EvaluationResult};

    // Inference
    pub use crate::inference::{predict_many, predict_one, InferenceConfig, PredictionResult, Predictor};
}
