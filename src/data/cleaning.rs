//! Raw table cleaning

use super::schema::{has_column, CUSTOMER_ID, NO, SENIOR_CITIZEN, TOTAL_CHARGES, YES};
use crate::error::{ChurnError, Result};
use crate::preprocessing::{ImputeStrategy, Imputer};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Column kinds as seen in a loaded table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTypes {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

/// Split the columns of `df` into numeric and categorical
pub fn feature_types(df: &DataFrame) -> FeatureTypes {
    let mut types = FeatureTypes::default();
    for column in df.get_columns() {
        let name = column.name().to_string();
        if is_numeric_dtype(column.dtype()) {
            types.numeric.push(name);
        } else {
            types.categorical.push(name);
        }
    }
    types
}

/// Row-wise type normalization shared by training and scoring.
///
/// `TotalCharges` becomes Float64 with unparseable or blank entries as 0.0;
/// `SeniorCitizen` 0/1 becomes `No`/`Yes`.
pub fn normalize_types(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();

    if has_column(df, TOTAL_CHARGES) {
        let coerced = coerce_charges(df.column(TOTAL_CHARGES)?)?;
        let n_zeroed = coerced.1;
        if n_zeroed > 0 {
            debug!(column = TOTAL_CHARGES, n_zeroed, "unparseable charges set to 0");
        }
        result.with_column(coerced.0)?;
    }

    if has_column(df, SENIOR_CITIZEN) {
        let mapped = map_binary_flag(df.column(SENIOR_CITIZEN)?)?;
        result.with_column(mapped)?;
    }

    Ok(result)
}

fn coerce_charges(column: &Column) -> Result<(Series, usize)> {
    let name = column.name().clone();
    let mut n_zeroed = 0usize;

    let values: Vec<f64> = if is_numeric_dtype(column.dtype()) {
        let as_f64 = column.cast(&DataType::Float64)?;
        as_f64
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(x) if x.is_finite() => x,
                _ => {
                    n_zeroed += 1;
                    0.0
                }
            })
            .collect()
    } else {
        let as_str = column.cast(&DataType::String)?;
        as_str
            .str()?
            .into_iter()
            .map(|v| match v.and_then(|s| s.trim().parse::<f64>().ok()) {
                Some(x) if x.is_finite() => x,
                _ => {
                    n_zeroed += 1;
                    0.0
                }
            })
            .collect()
    };

    Ok((Series::new(name, values), n_zeroed))
}

fn map_binary_flag(column: &Column) -> Result<Series> {
    let name = column.name().clone();
    let as_str = column.cast(&DataType::String)?;
    let mapped: Vec<Option<&str>> = as_str
        .str()?
        .into_iter()
        .map(|v| {
            v.and_then(|s| match s.trim() {
                YES => Some(YES),
                NO => Some(NO),
                other => match other.parse::<f64>() {
                    Ok(x) if x == 1.0 => Some(YES),
                    Ok(x) if x == 0.0 => Some(NO),
                    _ => None,
                },
            })
        })
        .collect();
    Ok(Series::new(name, mapped))
}

/// Boolean mask keeping the first occurrence of every distinct row
fn first_occurrence_mask(df: &DataFrame) -> Result<BooleanChunked> {
    let rendered: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|c| c.cast(&DataType::String))
        .collect::<PolarsResult<Vec<_>>>()?;
    let chunks: Vec<&StringChunked> = rendered
        .iter()
        .map(|c| c.str())
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(df.height());
    let keep: Vec<bool> = (0..df.height())
        .map(|row| {
            let key: Vec<Option<&str>> = chunks.iter().map(|ca| ca.get(row)).collect();
            seen.insert(key)
        })
        .collect();

    Ok(BooleanChunked::from_slice("keep".into(), &keep))
}

/// Clean a raw customer table.
///
/// Drops the identifier, normalizes types, removes exact duplicate rows
/// (first occurrence kept) and fills missing categorical values with the
/// column mode. Missing numeric values are an error.
pub fn clean(raw: &DataFrame) -> Result<DataFrame> {
    let n_raw = raw.height();

    let mut df = if has_column(raw, CUSTOMER_ID) {
        raw.drop(CUSTOMER_ID)?
    } else {
        raw.clone()
    };

    df = normalize_types(&df)?;

    let mask = first_occurrence_mask(&df)?;
    df = df.filter(&mask)?;
    let n_duplicates = n_raw - df.height();

    let types = feature_types(&df);
    for name in &types.numeric {
        let nulls = df.column(name)?.null_count();
        if nulls > 0 {
            return Err(ChurnError::DataError(format!(
                "numeric column {} has {} missing values",
                name, nulls
            )));
        }
    }

    let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
    let df = imputer.fit_transform(&df, &types.categorical)?;

    info!(
        rows_in = n_raw,
        rows_out = df.height(),
        duplicates_removed = n_duplicates,
        "cleaned customer table"
    );
    Ok(df)
}
