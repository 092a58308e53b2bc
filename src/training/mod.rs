//! Model training module
//!
//! Provides the churn classifiers and everything around them:
//! - Logistic regression, decision trees, random forests, gradient boosting
//! - Stratified train/test split and k-fold cross-validation
//! - [`ModelBundle`]: fitted transform + classifier, the persisted artifact
//! - [`TrainEngine`]: per-family training, evaluation and best-model selection
//! - [`train_full_pipeline`]: raw CSV to saved artifacts

mod bundle;
mod config;
mod engine;
mod models;
mod pipeline;
pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod linear_models;
pub mod random_forest;

pub use bundle::{build_classifier, BundleMetadata, ModelBundle};
pub use config::{ModelType, TrainingConfig};
pub use cross_validation::{stratified_train_test_split, CVResults, CVSplit, StratifiedKFold};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{select_best, TrainEngine, TrainingOutcome, DECISION_THRESHOLD};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use linear_models::LogisticRegression;
pub use models::{ClassWeight, Classifier, TrainedModel};
pub use pipeline::{train_full_pipeline, PipelineSummary};
pub use random_forest::{MaxFeatures, RandomForest};
