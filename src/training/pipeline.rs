//! End-to-end training run from the raw CSV to persisted artifacts

use super::engine::{TrainEngine, TrainingOutcome};
use crate::config::ChurnConfig;
use crate::data::{self, encode_labels};
use crate::error::{ChurnError, Result};
use crate::evaluation::{write_reports, EvaluationArtifact};
use crate::feature_engineering::derive;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// What a full training run produced and where it went
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub n_rows: usize,
    pub churn_rate: f64,
    pub evaluation: EvaluationArtifact,
    pub model_path: PathBuf,
    pub evaluation_path: PathBuf,
    pub report_files: Vec<PathBuf>,
    pub elapsed_secs: f64,
}

/// Clean, derive, train every family, then persist the best bundle,
/// the evaluation artifact and the reports.
pub fn train_full_pipeline(config: &ChurnConfig) -> Result<PipelineSummary> {
    let start = Instant::now();
    let paths = &config.paths;

    if !paths.raw_data.exists() {
        return Err(ChurnError::missing_dataset(&paths.raw_data));
    }

    info!(path = %paths.raw_data.display(), "loading raw data");
    let cleaned = data::load_and_prepare(&paths.raw_data, Some(&paths.processed_data))?;
    let labels = encode_labels(&cleaned, &config.training.target_column)?;
    let features = derive(&cleaned)?;
    let churn_rate = labels.mean().unwrap_or(0.0);
    info!(
        rows = features.height(),
        columns = features.width(),
        churn_rate,
        "engineered features"
    );

    let engine = TrainEngine::new(config.training.clone(), config.preprocessing.clone());
    let outcome: TrainingOutcome = engine.train(&features, &labels)?;

    let model_path = paths.model_path();
    let evaluation_path = paths.evaluation_path();
    outcome.best_bundle()?.save(&model_path)?;
    outcome.evaluation.save(&evaluation_path)?;
    let report_files = write_reports(&outcome.evaluation, &paths.reports_dir)?;

    let elapsed_secs = start.elapsed().as_secs_f64();
    info!(
        best = %outcome.evaluation.best_model,
        secs = elapsed_secs,
        "training pipeline finished"
    );

    Ok(PipelineSummary {
        n_rows: features.height(),
        churn_rate,
        evaluation: outcome.evaluation,
        model_path,
        evaluation_path,
        report_files,
        elapsed_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_raw_data() {
        let dir = tempdir().unwrap();
        let config = ChurnConfig::new().with_raw_data(dir.path().join("absent.csv"));
        let err = train_full_pipeline(&config).unwrap_err();
        assert!(err.is_missing_resource());
        assert!(err.to_string().contains("Dataset"));
    }
}
