//! Churn Sentinel CLI Module
//!
//! Command-line interface for training, scoring and inspecting results.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ChurnConfig;
use crate::data::{self, encode_labels, feature_types, CustomerRecord};
use crate::evaluation::EvaluationArtifact;
use crate::inference::{registry, Predictor, CHURN_LABEL, PREDICTION_COLUMN};
use crate::training::{train_full_pipeline, ModelBundle, ModelType};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn bad(s: &str) -> ColoredString    { s.truecolor(235, 100, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }

fn line_box(content: &str) {
    let visible = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_fail(msg: &str) {
    println!("  {} {}", bad("✗"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "churn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Customer churn prediction: train, compare and score")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file; defaults are used when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train every model family and keep the best one
    Train {
        /// Raw customer CSV (overrides the configured path)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Oversample churners with SMOTE instead of class weighting
        #[arg(long)]
        smote: bool,

        /// Stratified cross-validation folds on the training split (0 = off)
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Families to train, comma separated (logistic_regression, random_forest, gradient_boosting)
        #[arg(short, long, value_delimiter = ',')]
        models: Vec<String>,
    },

    /// Score a customer CSV and write it back with predictions appended
    Predict {
        /// Customer CSV to score
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV (defaults to <input>_predictions.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Model bundle (overrides the configured model directory)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Churn probability threshold
        #[arg(short, long)]
        threshold: Option<f64>,
    },

    /// Score a single customer given on the command line
    PredictOne {
        #[command(flatten)]
        customer: CustomerArgs,

        /// Model bundle (overrides the configured model directory)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the model comparison from the last training run
    Compare,

    /// Show feature importances of the trained model
    Importance {
        /// Number of features to show
        #[arg(short = 'n', long, default_value = "15")]
        top: usize,

        /// Model bundle (overrides the configured model directory)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Show dataset information
    Info {
        /// Customer CSV (defaults to the configured raw dataset)
        #[arg(short, long)]
        data: Option<PathBuf>,
    },

    /// Check that data, model and report locations are in place
    Verify,
}

/// Every base column of one customer
#[derive(Args, Debug, Clone)]
pub struct CustomerArgs {
    #[arg(long)]
    pub gender: String,
    #[arg(long)]
    pub senior_citizen: String,
    #[arg(long)]
    pub partner: String,
    #[arg(long)]
    pub dependents: String,
    #[arg(long)]
    pub tenure: f64,
    #[arg(long)]
    pub phone_service: String,
    #[arg(long)]
    pub multiple_lines: String,
    #[arg(long)]
    pub internet_service: String,
    #[arg(long)]
    pub online_security: String,
    #[arg(long)]
    pub online_backup: String,
    #[arg(long)]
    pub device_protection: String,
    #[arg(long)]
    pub tech_support: String,
    #[arg(long)]
    pub streaming_tv: String,
    #[arg(long)]
    pub streaming_movies: String,
    #[arg(long)]
    pub contract: String,
    #[arg(long)]
    pub paperless_billing: String,
    #[arg(long)]
    pub payment_method: String,
    #[arg(long)]
    pub monthly_charges: f64,
    #[arg(long)]
    pub total_charges: f64,
}

impl From<CustomerArgs> for CustomerRecord {
    fn from(a: CustomerArgs) -> Self {
        CustomerRecord {
            gender: a.gender,
            senior_citizen: a.senior_citizen,
            partner: a.partner,
            dependents: a.dependents,
            tenure: a.tenure,
            phone_service: a.phone_service,
            multiple_lines: a.multiple_lines,
            internet_service: a.internet_service,
            online_security: a.online_security,
            online_backup: a.online_backup,
            device_protection: a.device_protection,
            tech_support: a.tech_support,
            streaming_tv: a.streaming_tv,
            streaming_movies: a.streaming_movies,
            contract: a.contract,
            paperless_billing: a.paperless_billing,
            payment_method: a.payment_method,
            monthly_charges: a.monthly_charges,
            total_charges: a.total_charges,
        }
    }
}

// ─── Shared loading ────────────────────────────────────────────────────────────

/// Bundle from an explicit path, else the shared registry copy
fn load_bundle(config: &ChurnConfig, model: Option<&Path>) -> anyhow::Result<Arc<ModelBundle>> {
    match model {
        Some(path) => Ok(Arc::new(ModelBundle::load(path)?)),
        None => {
            let registry = registry();
            registry.configure(config.paths.clone());
            Ok(registry.model()?)
        }
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("customers");
    input.with_file_name(format!("{}_predictions.csv", stem))
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    config: &ChurnConfig,
    data: Option<PathBuf>,
    smote: bool,
    cv_folds: Option<usize>,
    models: &[String],
) -> anyhow::Result<()> {
    section("Train");

    let mut config = config.clone();
    if let Some(path) = data {
        config.paths.raw_data = path;
    }
    if smote {
        config.training.use_oversampling = true;
    }
    if let Some(folds) = cv_folds {
        config.training.cv_folds = folds;
    }
    if !models.is_empty() {
        config.training.models = models
            .iter()
            .map(|m| m.parse::<ModelType>())
            .collect::<Result<Vec<_>, _>>()?;
    }

    let families: Vec<&str> = config.training.models.iter().map(|m| m.display_name()).collect();
    println!("  {:<16} {}", muted("Data"), config.paths.raw_data.display());
    println!("  {:<16} {}", muted("Models"), families.join(", "));
    println!(
        "  {:<16} {}",
        muted("Imbalance"),
        if config.training.use_oversampling { "SMOTE" } else { "class weights" }
    );
    println!();

    step_run("Training");
    let start = Instant::now();
    let summary = train_full_pipeline(&config)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    section("Results");
    print!("{}", summary.evaluation.comparison_table());

    let best = &summary.evaluation.best_model;
    let f1 = summary
        .evaluation
        .metrics_for(best)
        .map(|m| m.f1_score)
        .unwrap_or(0.0);

    println!();
    line_box_top();
    line_box(&kv("Best model ", &best.bold().to_string()));
    line_box(&kv("F1         ", &format!("{:.4}", f1)));
    line_box(&kv("Rows       ", &summary.n_rows.to_string()));
    line_box(&kv("Churn rate ", &percent(summary.churn_rate)));
    line_box_bottom();
    println!();

    step_ok(&format!("model       → {}", summary.model_path.display()));
    step_ok(&format!("evaluation  → {}", summary.evaluation_path.display()));
    step_ok(&format!("reports     → {} ({} files)", config.paths.reports_dir.display(), summary.report_files.len()));
    println!();

    registry().invalidate();
    Ok(())
}

pub fn cmd_predict(
    config: &ChurnConfig,
    data_path: &Path,
    output: Option<&Path>,
    model: Option<&Path>,
    threshold: Option<f64>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let bundle = load_bundle(config, model)?;
    step_done(bundle.model_name());

    step_run("Loading data");
    let df = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let mut inference = config.inference.clone();
    if let Some(t) = threshold {
        inference = inference.with_threshold(t);
    }
    let predictor = Predictor::new(bundle, inference);

    step_run("Scoring");
    let start = Instant::now();
    let mut scored = predictor.predict_many(&df)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    let out_path = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(data_path));
    DataSaver::save_csv(&mut scored, &out_path)?;

    let labels = scored.column(PREDICTION_COLUMN)?.str()?.clone();
    let churners = labels
        .into_iter()
        .filter(|l| *l == Some(CHURN_LABEL))
        .count();

    println!();
    println!("  {:<16} {}", muted("Customers"), scored.height());
    println!(
        "  {:<16} {} ({})",
        muted("Predicted churn"),
        churners,
        percent(churners as f64 / scored.height().max(1) as f64)
    );
    println!();
    step_ok(&format!("predictions → {}", out_path.display()));
    println!();
    Ok(())
}

pub fn cmd_predict_one(
    config: &ChurnConfig,
    customer: CustomerArgs,
    model: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let record: CustomerRecord = customer.into();
    record.validate()?;

    let bundle = load_bundle(config, model)?;
    let predictor = Predictor::new(bundle, config.inference.clone());
    let result = predictor.predict_one(&record)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    section("Prediction");
    let label = if result.prediction == 1 {
        result.label.as_str().red().bold()
    } else {
        ok(&result.label).bold()
    };
    println!("  {:<18} {}", muted("Outcome"), label);
    println!("  {:<18} {}", muted("Churn probability"), percent(result.churn_probability).white());
    println!("  {:<18} {}", muted("Model"), predictor.bundle().model_name());
    println!();
    Ok(())
}

pub fn cmd_compare(config: &ChurnConfig) -> anyhow::Result<()> {
    section("Model Comparison");

    let registry = registry();
    registry.configure(config.paths.clone());
    let artifact: Arc<EvaluationArtifact> = registry.evaluation()?;

    print!("{}", artifact.comparison_table());
    println!();
    println!(
        "  {} {} {}",
        ok("best"),
        artifact.best_model.white().bold(),
        dim(&format!("trained {}", artifact.generated_at.format("%Y-%m-%d %H:%M UTC")))
    );
    for eval in &artifact.models {
        if let Some(cv) = &eval.cross_validation {
            println!(
                "  {:<22} {} {:.4} ± {:.4}",
                eval.model_name,
                muted("cv f1"),
                cv.mean_score,
                cv.std_score
            );
        }
    }
    println!();
    Ok(())
}

pub fn cmd_importance(config: &ChurnConfig, top: usize, model: Option<&Path>) -> anyhow::Result<()> {
    let bundle = load_bundle(config, model)?;
    section(&format!("Feature Importance · {}", bundle.model_name()));

    let Some(importances) = bundle.feature_importances() else {
        println!("  {}", "this model does not expose feature importances".yellow());
        println!();
        return Ok(());
    };

    let max = importances.first().map(|(_, v)| *v).unwrap_or(0.0);
    for (name, value) in importances.iter().take(top) {
        let bar_len = if max > 0.0 { ((value / max) * 24.0).round() as usize } else { 0 };
        println!(
            "  {:<36} {:>8.4} {}",
            name,
            value,
            accent(&"█".repeat(bar_len))
        );
    }
    println!();
    Ok(())
}

pub fn cmd_info(config: &ChurnConfig, data_path: Option<&Path>) -> anyhow::Result<()> {
    section("Data Info");

    let path = data_path.unwrap_or(config.paths.raw_data.as_path());
    let df = DataLoader::new().load_csv(path)?;

    println!("  {:<12} {}", muted("File"), path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!("  {:<12} {:.2} MB", muted("Memory"), df.estimated_size() as f64 / 1024.0 / 1024.0);

    if let Ok(labels) = encode_labels(&df, &config.training.target_column) {
        println!(
            "  {:<12} {}",
            muted("Churn rate"),
            percent(labels.mean().unwrap_or(0.0))
        );
    }

    let cleaned = data::clean(&df)?;
    let types = feature_types(&cleaned);
    println!(
        "  {:<12} {} numeric, {} categorical",
        muted("Features"),
        types.numeric.len(),
        types.categorical.len()
    );
    println!();

    println!("  {:<20} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(50)));

    for col in df.get_columns() {
        println!(
            "  {:<20} {:<12} {:>6} {:>8}",
            col.name(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}

/// Returns whether every check passed
pub fn cmd_verify(config: &ChurnConfig) -> anyhow::Result<bool> {
    section("Setup");

    let paths = &config.paths;
    let mut all_ok = true;

    let dirs = [
        ("raw data dir", paths.raw_data.parent().map(Path::to_path_buf)),
        ("processed data dir", paths.processed_data.parent().map(Path::to_path_buf)),
        ("model dir", Some(paths.model_dir.clone())),
        ("reports dir", Some(paths.reports_dir.clone())),
    ];
    for (label, dir) in dirs {
        match dir.filter(|d| d.as_os_str().is_empty() || d.is_dir()) {
            Some(d) => step_ok(&format!("{:<20} {}", label, dim(&d.display().to_string()))),
            None => {
                step_fail(&format!("{:<20} {}", label, "missing".yellow()));
                all_ok = false;
            }
        }
    }

    section("Dataset");
    match DataLoader::new().load_csv(&paths.raw_data) {
        Ok(df) => {
            step_ok(&format!("{} rows × {} cols", df.height(), df.width()));
            if let Err(e) = data::require_columns(&df, &data::REQUIRED_BASE_COLUMNS) {
                step_fail(&e.to_string());
                all_ok = false;
            }
        }
        Err(e) => {
            step_fail(&e.to_string());
            all_ok = false;
        }
    }

    section("Artifacts");
    for (label, path) in [("model", paths.model_path()), ("evaluation", paths.evaluation_path())] {
        if path.exists() {
            step_ok(&format!("{:<20} {}", label, dim(&path.display().to_string())));
        } else {
            step_fail(&format!("{:<20} {}", label, "not trained yet (run `churn train`)".yellow()));
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("  {}", ok("all checks passed"));
    } else {
        println!("  {}", bad("some checks failed"));
    }
    println!();
    Ok(all_ok)
}
