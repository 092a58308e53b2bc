//! Derived churn features: tenure bucket, spend ratios, service count

use crate::data::schema::{
    require_columns, MONTHLY_CHARGES, SERVICE_COLUMNS, TENURE, TOTAL_CHARGES, YES,
};
use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const TENURE_GROUP: &str = "TenureGroup";
pub const AVG_MONTHLY_CHARGES: &str = "AvgMonthlyCharges";
pub const CHARGE_RATIO: &str = "ChargeRatio";
pub const TOTAL_SERVICES: &str = "TotalServices";

/// Bucket edges in months
pub const TENURE_EDGES: [f64; 6] = [0.0, 12.0, 24.0, 48.0, 60.0, 100.0];

/// Tenure bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenureGroup {
    UpToOneYear,
    OneToTwoYears,
    TwoToFourYears,
    FourToFiveYears,
    OverFiveYears,
}

impl TenureGroup {
    const ALL: [TenureGroup; 5] = [
        TenureGroup::UpToOneYear,
        TenureGroup::OneToTwoYears,
        TenureGroup::TwoToFourYears,
        TenureGroup::FourToFiveYears,
        TenureGroup::OverFiveYears,
    ];

    /// Bucket a tenure value. The first bucket is closed `[0, 12]`, the rest
    /// are `(lo, hi]`; values outside `[0, 100]` are rejected.
    pub fn from_tenure(tenure: f64) -> Result<Self> {
        let (lo, hi) = (TENURE_EDGES[0], TENURE_EDGES[TENURE_EDGES.len() - 1]);
        if !(lo..=hi).contains(&tenure) {
            return Err(ChurnError::InvalidInput(format!(
                "tenure {} outside [{}, {}]",
                tenure, lo, hi
            )));
        }
        let idx = TENURE_EDGES[1..]
            .iter()
            .position(|&edge| tenure <= edge)
            .unwrap_or(Self::ALL.len() - 1);
        Ok(Self::ALL[idx])
    }

    pub fn label(&self) -> &'static str {
        match self {
            TenureGroup::UpToOneYear => "0-1 year",
            TenureGroup::OneToTwoYears => "1-2 years",
            TenureGroup::TwoToFourYears => "2-4 years",
            TenureGroup::FourToFiveYears => "4-5 years",
            TenureGroup::OverFiveYears => "5+ years",
        }
    }
}

/// Average monthly spend, falling back to the stated monthly charge for new customers
pub fn avg_monthly_charges(tenure: f64, monthly: f64, total: f64) -> f64 {
    if tenure > 0.0 {
        total / tenure
    } else {
        monthly
    }
}

/// Lifetime spend relative to the monthly charge, 0 when nothing is billed monthly
pub fn charge_ratio(monthly: f64, total: f64) -> f64 {
    if monthly > 0.0 {
        total / monthly
    } else {
        0.0
    }
}

fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| ChurnError::MissingField(name.to_string()))?;
    let as_f64 = column
        .cast(&DataType::Float64)
        .map_err(|e| ChurnError::DataError(format!("{}: {}", name, e)))?;
    as_f64
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| ChurnError::DataError(format!("row {}: {} is missing", row, name)))
        })
        .collect()
}

/// Append `TenureGroup`, `AvgMonthlyCharges`, `ChargeRatio` and `TotalServices`.
///
/// Row-wise and deterministic; an existing derived column is replaced, so
/// re-applying to an engineered table yields the same values.
pub fn derive(df: &DataFrame) -> Result<DataFrame> {
    let mut required = vec![TENURE, MONTHLY_CHARGES, TOTAL_CHARGES];
    required.extend_from_slice(&SERVICE_COLUMNS);
    require_columns(df, &required)?;

    let tenure = numeric_values(df, TENURE)?;
    let monthly = numeric_values(df, MONTHLY_CHARGES)?;
    let total = numeric_values(df, TOTAL_CHARGES)?;

    let groups: Vec<&str> = tenure
        .iter()
        .map(|&t| TenureGroup::from_tenure(t).map(|g| g.label()))
        .collect::<Result<Vec<_>>>()?;

    let avg: Vec<f64> = tenure
        .iter()
        .zip(monthly.iter().zip(total.iter()))
        .map(|(&t, (&m, &c))| avg_monthly_charges(t, m, c))
        .collect();

    let ratio: Vec<f64> = monthly
        .iter()
        .zip(total.iter())
        .map(|(&m, &c)| charge_ratio(m, c))
        .collect();

    let mut services = vec![0i64; df.height()];
    for name in SERVICE_COLUMNS {
        let as_str = df.column(name)?.cast(&DataType::String)?;
        for (count, value) in services.iter_mut().zip(as_str.str()?.into_iter()) {
            if value == Some(YES) {
                *count += 1;
            }
        }
    }

    let mut result = df.clone();
    result.with_column(Series::new(TENURE_GROUP.into(), groups))?;
    result.with_column(Series::new(AVG_MONTHLY_CHARGES.into(), avg))?;
    result.with_column(Series::new(CHARGE_RATIO.into(), ratio))?;
    result.with_column(Series::new(TOTAL_SERVICES.into(), services))?;
    Ok(result)
}
