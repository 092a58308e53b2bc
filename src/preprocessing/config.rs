//! Preprocessing configuration

use super::ScalerType;
use crate::data::schema::{
    CONTRACT, DEPENDENTS, DEVICE_PROTECTION, GENDER, INTERNET_SERVICE, MONTHLY_CHARGES,
    MULTIPLE_LINES, ONLINE_BACKUP, ONLINE_SECURITY, PAPERLESS_BILLING, PARTNER, PAYMENT_METHOD,
    PHONE_SERVICE, SENIOR_CITIZEN, STREAMING_MOVIES, STREAMING_TV, TECH_SUPPORT, TENURE,
    TOTAL_CHARGES,
};
use crate::feature_engineering::{AVG_MONTHLY_CHARGES, CHARGE_RATIO, TENURE_GROUP, TOTAL_SERVICES};
use serde::{Deserialize, Serialize};

/// Configuration for the fitted feature transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Columns scaled as numbers, in output order
    pub numeric_columns: Vec<String>,

    /// Columns expanded into indicator columns, in output order
    pub categorical_columns: Vec<String>,

    /// Type of scaler to use for numeric features
    pub scaler_type: ScalerType,

    /// Omit the first category of every categorical column
    pub drop_first: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        let numeric = [
            TENURE,
            MONTHLY_CHARGES,
            TOTAL_CHARGES,
            AVG_MONTHLY_CHARGES,
            CHARGE_RATIO,
            TOTAL_SERVICES,
        ];
        let categorical = [
            GENDER,
            SENIOR_CITIZEN,
            PARTNER,
            DEPENDENTS,
            PHONE_SERVICE,
            MULTIPLE_LINES,
            INTERNET_SERVICE,
            ONLINE_SECURITY,
            ONLINE_BACKUP,
            DEVICE_PROTECTION,
            TECH_SUPPORT,
            STREAMING_TV,
            STREAMING_MOVIES,
            CONTRACT,
            PAPERLESS_BILLING,
            PAYMENT_METHOD,
            TENURE_GROUP,
        ];
        Self {
            numeric_columns: numeric.iter().map(|s| s.to_string()).collect(),
            categorical_columns: categorical.iter().map(|s| s.to_string()).collect(),
            scaler_type: ScalerType::Standard,
            drop_first: true,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the numeric columns
    pub fn with_numeric_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.numeric_columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Builder method to set the categorical columns
    pub fn with_categorical_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.categorical_columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    /// Builder method to set scaler type
    pub fn with_scaler(mut self, scaler_type: ScalerType) -> Self {
        self.scaler_type = scaler_type;
        self
    }

    /// Builder method to keep or drop the reference category
    pub fn with_drop_first(mut self, drop_first: bool) -> Self {
        self.drop_first = drop_first;
        self
    }
}
