//! Fitted feature transform: scaled numeric columns followed by one-hot indicators

use super::{OneHotEncoder, PreprocessingConfig, Scaler};
use crate::error::{ChurnError, Result};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The learned numeric-scaling and categorical-encoding function.
///
/// Built once by [`FeatureTransform::fit`] on training data and never
/// relearned; columns outside the declared sets are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransform {
    config: PreprocessingConfig,
    scaler: Scaler,
    encoder: OneHotEncoder,
    feature_names: Vec<String>,
}

impl FeatureTransform {
    /// Learn scaling parameters and vocabularies from `df`
    pub fn fit(df: &DataFrame, config: &PreprocessingConfig) -> Result<Self> {
        if df.height() == 0 {
            return Err(ChurnError::PreprocessingError(
                "cannot fit a transform on an empty table".to_string(),
            ));
        }

        let mut scaler = Scaler::new(config.scaler_type.clone());
        scaler.fit(df, &config.numeric_columns)?;

        let mut encoder = OneHotEncoder::new(config.drop_first);
        encoder.fit(df, &config.categorical_columns)?;

        let mut feature_names = scaler.columns();
        feature_names.extend(encoder.feature_names());

        debug!(
            n_numeric = config.numeric_columns.len(),
            n_categorical = config.categorical_columns.len(),
            n_features = feature_names.len(),
            "fitted feature transform"
        );

        Ok(Self {
            config: config.clone(),
            scaler,
            encoder,
            feature_names,
        })
    }

    /// Encode `df` into the frozen feature layout
    pub fn apply(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let numeric = self.scaler.transform(df)?;
        let indicators = self.encoder.transform(df)?;
        let x = concatenate(Axis(1), &[numeric.view(), indicators.view()])?;

        if x.ncols() != self.feature_names.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", self.feature_names.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x)
    }

    /// Output column names, numeric first then `<column>_<category>` indicators
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }
}
