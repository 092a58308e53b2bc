//! Inference configuration

use serde::{Deserialize, Serialize};

/// `Churn_Prediction` value for predicted churners
pub const CHURN_LABEL: &str = "Churn";
/// `Churn_Prediction` value for predicted stayers
pub const NO_CHURN_LABEL: &str = "No Churn";

/// Configuration for churn scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Probability above which a customer is labelled as churning
    pub threshold: f64,

    /// Rows per scoring chunk for batch prediction
    pub batch_size: usize,

    /// Score chunks on the rayon pool
    pub parallel: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            batch_size: 1000,
            parallel: true,
        }
    }
}

impl InferenceConfig {
    /// Create a new inference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set classification threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Builder method to set batch size
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Whether a churn probability counts as churning; the threshold itself does not
    pub fn is_churn(&self, probability: f64) -> bool {
        probability > self.threshold
    }

    /// Label for a churn probability
    pub fn label_for(&self, probability: f64) -> &'static str {
        if self.is_churn(probability) {
            CHURN_LABEL
        } else {
            NO_CHURN_LABEL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.label_for(0.51), "Churn");
        assert_eq!(config.label_for(0.5), "No Churn");
        assert_eq!(config.label_for(0.49), "No Churn");
    }

    #[test]
    fn test_builder_pattern() {
        let config = InferenceConfig::new()
            .with_threshold(0.3)
            .with_batch_size(0)
            .with_parallel(false);

        assert_eq!(config.batch_size, 1);
        assert!(!config.parallel);
        assert_eq!(config.label_for(0.35), "Churn");
    }

    #[test]
    fn test_labels_ignore_config_file_overrides() {
        let json = r#"{"threshold": 0.4, "positive_label": "Leaving", "negative_label": "Staying"}"#;
        let config: InferenceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.threshold, 0.4);
        assert_eq!(config.label_for(0.9), CHURN_LABEL);
        assert_eq!(config.label_for(0.1), NO_CHURN_LABEL);
    }
}
