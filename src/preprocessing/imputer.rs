//! Missing value imputation for categorical columns

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for filling missing categorical values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Most frequent value; ties go to the smallest value in sort order
    MostFrequent,
}

/// Categorical imputer, learns one fill value per column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: Vec<(String, String)>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the fill value of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.fill_values.clear();
        for name in columns {
            let column = df
                .column(name)
                .map_err(|_| ChurnError::MissingField(name.clone()))?;
            let as_str = column.cast(&DataType::String)?;
            let values = as_str.str()?;

            let fill = match self.strategy {
                ImputeStrategy::MostFrequent => most_frequent(values),
            };
            match fill {
                Some(value) => self.fill_values.push((name.clone(), value)),
                None if column.null_count() > 0 => {
                    return Err(ChurnError::DataError(format!(
                        "column {} has no observed values to impute from",
                        name
                    )))
                }
                None => {}
            }
        }
        self.is_fitted = true;
        Ok(self)
    }

    /// Fill nulls in every fitted column; other columns are left untouched
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (name, fill) in &self.fill_values {
            let column = df
                .column(name)
                .map_err(|_| ChurnError::MissingField(name.clone()))?;
            if column.null_count() == 0 {
                continue;
            }
            let as_str = column.cast(&DataType::String)?;
            let filled: Vec<String> = as_str
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or(fill.as_str()).to_string())
                .collect();
            result.with_column(Series::new(name.as_str().into(), filled))?;
        }
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Learned fill value for `column`
    pub fn fill_value(&self, column: &str) -> Option<&str> {
        self.fill_values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.as_str())
    }
}

fn most_frequent(values: &StringChunked) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.into_iter().flatten() {
        *counts.entry(v).or_insert(0) += 1;
    }
    let max = counts.values().copied().max()?;
    // keys iterate sorted, so the first at the maximum wins ties
    counts
        .into_iter()
        .find(|(_, count)| *count == max)
        .map(|(v, _)| v.to_string())
}
