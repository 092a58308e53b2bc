//! Data preprocessing module
//!
//! Provides the fitted feature transform used by every trained model:
//! - Missing value imputation (categorical mode)
//! - Feature scaling (StandardScaler, MinMaxScaler)
//! - One-hot encoding with a frozen vocabulary
//! - [`FeatureTransform`], the ordered composition of the above

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::PreprocessingConfig;
pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::FeatureTransform;
pub use scaler::{Scaler, ScalerType};
