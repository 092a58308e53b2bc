//! Top-level configuration: file locations plus per-stage settings

use crate::error::{ChurnError, Result};
use crate::inference::InferenceConfig;
use crate::preprocessing::PreprocessingConfig;
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where datasets, artifacts and reports live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_data: PathBuf,
    pub processed_data: PathBuf,
    pub model_dir: PathBuf,
    pub reports_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("data/raw/WA_Fn-UseC_-Telco-Customer-Churn.csv"),
            processed_data: PathBuf::from("data/processed/telco_churn_clean.csv"),
            model_dir: PathBuf::from("models"),
            reports_dir: PathBuf::from("reports"),
        }
    }
}

impl PathsConfig {
    /// Persisted model bundle
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join("model.json")
    }

    /// Persisted evaluation artifact, next to the bundle
    pub fn evaluation_path(&self) -> PathBuf {
        self.model_dir.join("evaluation.json")
    }
}

/// Everything the pipeline can be configured with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    pub paths: PathsConfig,
    pub preprocessing: PreprocessingConfig,
    pub training: TrainingConfig,
    pub inference: InferenceConfig,
}

impl ChurnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config; absent keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            ChurnError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| ChurnError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// `from_file` when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn with_raw_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.raw_data = path.into();
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.model_dir = dir.into();
        self
    }

    pub fn with_reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.reports_dir = dir.into();
        self
    }

    pub fn with_processed_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.processed_data = path.into();
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_locations() {
        let config = ChurnConfig::default();
        assert_eq!(config.paths.model_path(), PathBuf::from("models/model.json"));
        assert_eq!(
            config.paths.evaluation_path(),
            PathBuf::from("models/evaluation.json")
        );
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.inference.threshold, 0.5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("churn.json");
        fs::write(&path, r#"{"paths": {"model_dir": "artifacts"}, "training": {"cv_folds": 5}}"#)
            .unwrap();

        let config = ChurnConfig::from_file(&path).unwrap();
        assert_eq!(config.paths.model_path(), PathBuf::from("artifacts/model.json"));
        assert_eq!(config.paths.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.training.cv_folds, 5);
        assert_eq!(config.training.random_state, Some(42));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf/churn.json");
        let config = ChurnConfig::new().with_reports_dir("out/reports");
        config.save(&path).unwrap();
        assert_eq!(ChurnConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ChurnConfig::from_file(&path),
            Err(ChurnError::ConfigError(_))
        ));
    }
}
