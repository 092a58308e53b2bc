//! Error types for the churn pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Main error type for the churn pipeline
#[derive(Error, Debug)]
pub enum ChurnError {
    /// A dataset or trained artifact is absent on disk
    #[error("{resource} not found at {path}; {hint}")]
    MissingResource {
        resource: String,
        path: String,
        hint: String,
    },

    #[error("Data error: {0}")]
    DataError(String),

    /// A record or table lacks a required column
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Convergence failed after {iterations} iterations")]
    ConvergenceError { iterations: usize },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ChurnError {
    /// Missing trained model or evaluation artifact
    pub fn missing_artifact(resource: &str, path: &std::path::Path) -> Self {
        ChurnError::MissingResource {
            resource: resource.to_string(),
            path: path.display().to_string(),
            hint: "run training first (`churn train`)".to_string(),
        }
    }

    /// Missing input dataset
    pub fn missing_dataset(path: &std::path::Path) -> Self {
        ChurnError::MissingResource {
            resource: "Dataset".to_string(),
            path: path.display().to_string(),
            hint: "place the raw customer CSV there or pass --data".to_string(),
        }
    }

    /// Whether the caller can recover by producing the missing file
    pub fn is_missing_resource(&self) -> bool {
        matches!(self, ChurnError::MissingResource { .. })
    }
}

impl From<polars::error::PolarsError> for ChurnError {
    fn from(err: polars::error::PolarsError) -> Self {
        ChurnError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ChurnError {
    fn from(err: serde_json::Error) -> Self {
        ChurnError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ChurnError {
    fn from(err: ndarray::ShapeError) -> Self {
        ChurnError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_display() {
        let err = ChurnError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChurnError = io_err.into();
        assert!(matches!(err, ChurnError::IoError(_)));
    }

    #[test]
    fn test_missing_artifact_mentions_training() {
        let err = ChurnError::missing_artifact("Trained model", Path::new("models/model.json"));
        assert!(err.is_missing_resource());
        let msg = err.to_string();
        assert!(msg.contains("models/model.json"));
        assert!(msg.contains("run training first"));
    }

    #[test]
    fn test_missing_field_display() {
        let err = ChurnError::MissingField("tenure".to_string());
        assert_eq!(err.to_string(), "Missing field: tenure");
    }
}
