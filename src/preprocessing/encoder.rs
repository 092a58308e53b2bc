//! Categorical encoding

use crate::error::{ChurnError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Vocabulary learned for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ColumnVocabulary {
    column: String,
    /// Sorted categories observed at fit time
    categories: Vec<String>,
}

impl ColumnVocabulary {
    /// Categories that get an indicator column
    fn encoded<'a>(&'a self, drop_first: bool) -> &'a [String] {
        if drop_first && !self.categories.is_empty() {
            &self.categories[1..]
        } else {
            &self.categories
        }
    }
}

/// One-hot encoder with a frozen vocabulary.
///
/// Values never seen at fit time (and nulls) encode as an all-zero row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    drop_first: bool,
    vocabularies: Vec<ColumnVocabulary>,
    is_fitted: bool,
}

fn string_column(df: &DataFrame, name: &str) -> Result<Column> {
    let column = df
        .column(name)
        .map_err(|_| ChurnError::MissingField(name.to_string()))?;
    Ok(column.cast(&DataType::String)?)
}

impl OneHotEncoder {
    /// Create a new encoder
    pub fn new(drop_first: bool) -> Self {
        Self {
            drop_first,
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the sorted vocabulary of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        let mut vocabularies = Vec::with_capacity(columns.len());
        for name in columns {
            let as_str = string_column(df, name)?;
            let categories: BTreeSet<String> = as_str
                .str()?
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();
            vocabularies.push(ColumnVocabulary {
                column: name.clone(),
                categories: categories.into_iter().collect(),
            });
        }
        self.vocabularies = vocabularies;
        self.is_fitted = true;
        Ok(self)
    }

    /// Number of indicator columns produced by `transform`
    pub fn n_output_features(&self) -> usize {
        self.vocabularies
            .iter()
            .map(|v| v.encoded(self.drop_first).len())
            .sum()
    }

    /// Indicator column names as `<column>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| {
                v.encoded(self.drop_first)
                    .iter()
                    .map(move |c| format!("{}_{}", v.column, c))
            })
            .collect()
    }

    /// Encode the fitted columns into an `n_rows x n_indicators` matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_output_features()));
        let mut offset = 0;
        for vocab in &self.vocabularies {
            let encoded = vocab.encoded(self.drop_first);
            let as_str = string_column(df, &vocab.column)?;
            for (i, value) in as_str.str()?.into_iter().enumerate() {
                let hit = value.and_then(|v| encoded.iter().position(|c| c == v));
                if let Some(j) = hit {
                    out[[i, offset + j]] = 1.0;
                }
            }
            offset += encoded.len();
        }
        Ok(out)
    }

    /// Fitted categories of a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.categories.as_slice())
    }
}
