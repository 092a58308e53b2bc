//! Feature engineering
//!
//! Pure row-wise derivations applied identically at training and scoring time.

mod churn_features;

pub use churn_features::{
    avg_monthly_charges, charge_ratio, derive, TenureGroup, AVG_MONTHLY_CHARGES, CHARGE_RATIO,
    TENURE_EDGES, TENURE_GROUP, TOTAL_SERVICES,
};
