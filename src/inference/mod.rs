//! Prediction service
//!
//! Scores customers with a trained [`ModelBundle`](crate::training::ModelBundle):
//! - `predict_one` for a single typed [`CustomerRecord`](crate::data::CustomerRecord)
//! - `predict_many` for a table, appending prediction and probability columns
//! - chunked, rayon-parallel scoring for large tables
//! - a process-wide artifact registry with explicit invalidation

mod config;
mod engine;
pub mod registry;

pub use config::{InferenceConfig, CHURN_LABEL, NO_CHURN_LABEL};
pub use engine::{
    predict_many, predict_one, PredictionResult, Predictor, NO_CHURN_PROBABILITY_COLUMN,
    PREDICTION_COLUMN, PROBABILITY_COLUMN,
};
pub use registry::{registry, ArtifactRegistry};
