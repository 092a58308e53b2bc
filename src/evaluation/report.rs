//! Evaluation artifact, model comparison and report files

use super::metrics::{ConfusionMatrix, EvaluationResult, RocPoint};
use crate::error::{ChurnError, Result};
use crate::training::CVResults;
use crate::utils::DataSaver;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything measured for one trained family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub model_name: String,
    pub metrics: EvaluationResult,
    pub confusion_matrix: ConfusionMatrix,
    pub roc_curve: Vec<RocPoint>,
    pub classification_report: String,
    /// Cross-validated F1 on the training partition, when CV ran
    pub cross_validation: Option<CVResults>,
    pub training_time_secs: f64,
}

/// A family whose fit or evaluation failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedModel {
    pub model_name: String,
    pub error: String,
}

/// Persisted record of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationArtifact {
    pub best_model: String,
    /// In training order
    pub models: Vec<ModelEvaluation>,
    pub failed: Vec<FailedModel>,
    pub generated_at: DateTime<Utc>,
}

/// On-disk layout: the artifact plus a `metrics` map keyed by model name
#[derive(Serialize)]
struct ArtifactFile<'a> {
    best_model: &'a str,
    metrics: BTreeMap<&'a str, EvaluationResult>,
    models: &'a [ModelEvaluation],
    failed: &'a [FailedModel],
    generated_at: DateTime<Utc>,
}

/// One row of the comparison table
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub model_name: String,
    pub metrics: EvaluationResult,
}

impl EvaluationArtifact {
    /// Metrics of a model by name
    pub fn metrics_for(&self, model_name: &str) -> Option<&EvaluationResult> {
        self.models
            .iter()
            .find(|m| m.model_name == model_name)
            .map(|m| &m.metrics)
    }

    /// Model name → metrics for every evaluated family
    pub fn metrics_by_model(&self) -> BTreeMap<&str, EvaluationResult> {
        self.models
            .iter()
            .map(|m| (m.model_name.as_str(), m.metrics))
            .collect()
    }

    /// Rows sorted by F1 descending; equal F1 keeps training order
    pub fn comparison(&self) -> Vec<ComparisonRow> {
        let mut rows: Vec<ComparisonRow> = self
            .models
            .iter()
            .map(|m| ComparisonRow {
                model_name: m.model_name.clone(),
                metrics: m.metrics,
            })
            .collect();
        rows.sort_by(|a, b| b.metrics.f1_score.total_cmp(&a.metrics.f1_score));
        rows
    }

    /// Fixed-width comparison table
    pub fn comparison_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<22} {:>9} {:>10} {:>8} {:>9} {:>8}",
            "Model", "Accuracy", "Precision", "Recall", "F1", "ROC AUC"
        );
        for row in self.comparison() {
            let m = row.metrics;
            let marker = if row.model_name == self.best_model { " *" } else { "" };
            let _ = writeln!(
                out,
                "{:<22} {:>9.4} {:>10.4} {:>8.4} {:>9.4} {:>8.4}{}",
                row.model_name, m.accuracy, m.precision, m.recall, m.f1_score, m.roc_auc, marker
            );
        }
        for failed in &self.failed {
            let _ = writeln!(out, "{:<22} failed: {}", failed.model_name, failed.error);
        }
        out
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = ArtifactFile {
            best_model: &self.best_model,
            metrics: self.metrics_by_model(),
            models: &self.models,
            failed: &self.failed,
            generated_at: self.generated_at,
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChurnError::missing_artifact("Evaluation results", path));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

fn comparison_frame(artifact: &EvaluationArtifact) -> Result<DataFrame> {
    let rows = artifact.comparison();
    let pick = |f: fn(&EvaluationResult) -> f64| rows.iter().map(|r| f(&r.metrics)).collect::<Vec<f64>>();
    let names: Vec<&str> = rows.iter().map(|r| r.model_name.as_str()).collect();
    Ok(df!(
        "model" => names,
        "accuracy" => pick(|m| m.accuracy),
        "precision" => pick(|m| m.precision),
        "recall" => pick(|m| m.recall),
        "f1_score" => pick(|m| m.f1_score),
        "roc_auc" => pick(|m| m.roc_auc)
    )?)
}

fn roc_frame(points: &[RocPoint]) -> Result<DataFrame> {
    Ok(df!(
        "threshold" => points.iter().map(|p| p.threshold).collect::<Vec<f64>>(),
        "fpr" => points.iter().map(|p| p.fpr).collect::<Vec<f64>>(),
        "tpr" => points.iter().map(|p| p.tpr).collect::<Vec<f64>>()
    )?)
}

fn model_report(eval: &ModelEvaluation) -> String {
    let m = &eval.metrics;
    let cm = &eval.confusion_matrix;
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===\n", eval.model_name);
    let _ = writeln!(out, "Accuracy:  {:.4}", m.accuracy);
    let _ = writeln!(out, "Precision: {:.4}", m.precision);
    let _ = writeln!(out, "Recall:    {:.4}", m.recall);
    let _ = writeln!(out, "F1 Score:  {:.4}", m.f1_score);
    let _ = writeln!(out, "ROC AUC:   {:.4}", m.roc_auc);
    if let Some(cv) = &eval.cross_validation {
        let _ = writeln!(
            out,
            "CV F1:     {:.4} (+/- {:.4}, {} folds)",
            cv.mean_score, cv.std_score, cv.n_folds
        );
    }
    let _ = writeln!(out, "\n--- Confusion Matrix ---");
    let _ = writeln!(out, "{:>14} {:>10} {:>10}", "", "pred No", "pred Yes");
    let _ = writeln!(out, "{:>14} {:>10} {:>10}", "actual No", cm.true_negative, cm.false_positive);
    let _ = writeln!(out, "{:>14} {:>10} {:>10}", "actual Yes", cm.false_negative, cm.true_positive);
    let _ = writeln!(out, "\n--- Classification Report ---");
    out.push_str(&eval.classification_report);
    out
}

/// Write per-model reports, ROC points and the comparison table under `dir`
pub fn write_reports(artifact: &EvaluationArtifact, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for eval in &artifact.models {
        let stem = eval.model_name.replace(' ', "_");

        let report_path = dir.join(format!("{}_report.txt", stem));
        fs::write(&report_path, model_report(eval))?;
        written.push(report_path);

        let roc_path = dir.join(format!("{}_roc.csv", stem));
        DataSaver::save_csv(&mut roc_frame(&eval.roc_curve)?, &roc_path)?;
        written.push(roc_path);
    }

    let table_path = dir.join("model_comparison.txt");
    fs::write(&table_path, artifact.comparison_table())?;
    written.push(table_path);

    let csv_path = dir.join("model_comparison.csv");
    DataSaver::save_csv(&mut comparison_frame(artifact)?, &csv_path)?;
    written.push(csv_path);

    info!(dir = %dir.display(), files = written.len(), "wrote evaluation reports");
    Ok(written)
}


#[cfg(test)]
mod tests {
    use super::fixtures::artifact;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_comparison_sorted_by_f1_stable() {
        let names: Vec<String> = artifact()
            .comparison()
            .into_iter()
            .map(|r| r.model_name)
            .collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_comparison_table_marks_best_and_failures() {
        let table = artifact().comparison_table();
        assert!(table.lines().nth(1).is_some_and(|l| l.starts_with("B") && l.ends_with('*')));
        assert!(table.contains("D"));
        assert!(table.contains("failed: boom"));
    }

    #[test]
    fn test_artifact_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models/evaluation.json");
        let original = artifact();
        original.save(&path).unwrap();

        let loaded = EvaluationArtifact::load(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.metrics_for("A").map(|m| m.f1_score), Some(0.70));
    }

    #[test]
    fn test_saved_json_maps_model_to_metrics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("evaluation.json");
        artifact().save(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["best_model"], "B");
        let metrics = json["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics["A"]["f1_score"], 0.70);
        for key in ["accuracy", "precision", "recall", "f1_score", "roc_auc"] {
            assert!(metrics["C"].get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempdir().unwrap();
        let err = EvaluationArtifact::load(&dir.path().join("evaluation.json")).unwrap_err();
        assert!(err.is_missing_resource());
    }

    #[test]
    fn test_write_reports() {
        let dir = tempdir().unwrap();
        let written = write_reports(&artifact(), dir.path()).unwrap();

        assert_eq!(written.len(), 3 * 2 + 2);
        assert!(dir.path().join("A_report.txt").exists());
        assert!(dir.path().join("B_roc.csv").exists());
        let csv = fs::read_to_string(dir.path().join("model_comparison.csv")).unwrap();
        assert!(csv.starts_with("model,accuracy"));
    }
}
