//! Customer record schema: column names, vocabularies and the typed record

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const CUSTOMER_ID: &str = "customerID";
pub const GENDER: &str = "gender";
pub const SENIOR_CITIZEN: &str = "SeniorCitizen";
pub const PARTNER: &str = "Partner";
pub const DEPENDENTS: &str = "Dependents";
pub const TENURE: &str = "tenure";
pub const PHONE_SERVICE: &str = "PhoneService";
pub const MULTIPLE_LINES: &str = "MultipleLines";
pub const INTERNET_SERVICE: &str = "InternetService";
pub const ONLINE_SECURITY: &str = "OnlineSecurity";
pub const ONLINE_BACKUP: &str = "OnlineBackup";
pub const DEVICE_PROTECTION: &str = "DeviceProtection";
pub const TECH_SUPPORT: &str = "TechSupport";
pub const STREAMING_TV: &str = "StreamingTV";
pub const STREAMING_MOVIES: &str = "StreamingMovies";
pub const CONTRACT: &str = "Contract";
pub const PAPERLESS_BILLING: &str = "PaperlessBilling";
pub const PAYMENT_METHOD: &str = "PaymentMethod";
pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
pub const TOTAL_CHARGES: &str = "TotalCharges";
pub const CHURN: &str = "Churn";

/// Value marking a subscribed service or a positive flag
pub const YES: &str = "Yes";
pub const NO: &str = "No";

/// Every column a record must carry to be scored (identifier and label excluded)
pub const REQUIRED_BASE_COLUMNS: [&str; 19] = [
    GENDER,
    SENIOR_CITIZEN,
    PARTNER,
    DEPENDENTS,
    TENURE,
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
    MONTHLY_CHARGES,
    TOTAL_CHARGES,
];

/// Service columns counted by the service-count feature
pub const SERVICE_COLUMNS: [&str; 9] = [
    PHONE_SERVICE,
    MULTIPLE_LINES,
    INTERNET_SERVICE,
    ONLINE_SECURITY,
    ONLINE_BACKUP,
    DEVICE_PROTECTION,
    TECH_SUPPORT,
    STREAMING_TV,
    STREAMING_MOVIES,
];

const YES_NO: &[&str] = &[NO, YES];
const INTERNET_ADDON: &[&str] = &[NO, YES, "No internet service"];

/// Allowed values for a categorical base column, `None` for numeric columns
pub fn vocabulary(column: &str) -> Option<&'static [&'static str]> {
    match column {
        GENDER => Some(&["Female", "Male"]),
        SENIOR_CITIZEN | PARTNER | DEPENDENTS | PHONE_SERVICE | PAPERLESS_BILLING => Some(YES_NO),
        MULTIPLE_LINES => Some(&[NO, YES, "No phone service"]),
        INTERNET_SERVICE => Some(&["DSL", "Fiber optic", NO]),
        ONLINE_SECURITY | ONLINE_BACKUP | DEVICE_PROTECTION | TECH_SUPPORT | STREAMING_TV
        | STREAMING_MOVIES => Some(INTERNET_ADDON),
        CONTRACT => Some(&["Month-to-month", "One year", "Two year"]),
        PAYMENT_METHOD => Some(&[
            "Electronic check",
            "Mailed check",
            "Bank transfer (automatic)",
            "Credit card (automatic)",
        ]),
        _ => None,
    }
}

/// Fail with a missing-field error for the first required column absent from `df`
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    for &name in columns {
        if !present.iter().any(|c| c.as_str() == name) {
            return Err(ChurnError::MissingField(name.to_string()));
        }
    }
    Ok(())
}

/// Whether `df` carries a column called `name`
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Map a Yes/No label column (normally `Churn`) to 1.0 / 0.0
pub fn encode_labels(df: &DataFrame, label_column: &str) -> Result<Array1<f64>> {
    let column = df
        .column(label_column)
        .map_err(|_| ChurnError::MissingField(label_column.to_string()))?;
    let as_str = column.cast(&DataType::String)?;
    let values = as_str.str()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value.map(str::trim) {
            Some(YES) | Some("1") => Ok(1.0),
            Some(NO) | Some("0") => Ok(0.0),
            other => Err(ChurnError::DataError(format!(
                "row {}: unexpected {} label {:?}",
                row, label_column, other
            ))),
        })
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from_vec)
}

/// One fully specified customer, the single-prediction input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub gender: String,
    pub senior_citizen: String,
    pub partner: String,
    pub dependents: String,
    pub tenure: f64,
    pub phone_service: String,
    pub multiple_lines: String,
    pub internet_service: String,
    pub online_security: String,
    pub online_backup: String,
    pub device_protection: String,
    pub tech_support: String,
    pub streaming_tv: String,
    pub streaming_movies: String,
    pub contract: String,
    pub paperless_billing: String,
    pub payment_method: String,
    pub monthly_charges: f64,
    pub total_charges: f64,
}

impl CustomerRecord {
    fn categorical_fields(&self) -> [(&'static str, &str); 16] {
        [
            (GENDER, &self.gender),
            (SENIOR_CITIZEN, &self.senior_citizen),
            (PARTNER, &self.partner),
            (DEPENDENTS, &self.dependents),
            (PHONE_SERVICE, &self.phone_service),
            (MULTIPLE_LINES, &self.multiple_lines),
            (INTERNET_SERVICE, &self.internet_service),
            (ONLINE_SECURITY, &self.online_security),
            (ONLINE_BACKUP, &self.online_backup),
            (DEVICE_PROTECTION, &self.device_protection),
            (TECH_SUPPORT, &self.tech_support),
            (STREAMING_TV, &self.streaming_tv),
            (STREAMING_MOVIES, &self.streaming_movies),
            (CONTRACT, &self.contract),
            (PAPERLESS_BILLING, &self.paperless_billing),
            (PAYMENT_METHOD, &self.payment_method),
        ]
    }

    /// Check numeric invariants and per-column vocabularies
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            (TENURE, self.tenure),
            (MONTHLY_CHARGES, self.monthly_charges),
            (TOTAL_CHARGES, self.total_charges),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChurnError::InvalidInput(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        for (name, value) in self.categorical_fields() {
            if let Some(allowed) = vocabulary(name) {
                if !allowed.contains(&value) {
                    return Err(ChurnError::InvalidInput(format!(
                        "{} = {:?} is not one of {:?}",
                        name, value, allowed
                    )));
                }
            }
        }
        Ok(())
    }

    /// Single-row frame with the base columns in canonical order
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(REQUIRED_BASE_COLUMNS.len());
        let categorical = self.categorical_fields();

        for name in REQUIRED_BASE_COLUMNS {
            let column: Column = match name {
                TENURE => Series::new(name.into(), [self.tenure]).into(),
                MONTHLY_CHARGES => Series::new(name.into(), [self.monthly_charges]).into(),
                TOTAL_CHARGES => Series::new(name.into(), [self.total_charges]).into(),
                _ => {
                    let value = categorical
                        .iter()
                        .find(|(col, _)| *col == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| ChurnError::MissingField(name.to_string()))?;
                    Series::new(name.into(), [value]).into()
                }
            };
            columns.push(column);
        }

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::CustomerRecord;

    pub fn month_to_month_customer() -> CustomerRecord {
        CustomerRecord {
            gender: "Female".into(),
            senior_citizen: "No".into(),
            partner: "Yes".into(),
            dependents: "No".into(),
            tenure: 12.0,
            phone_service: "Yes".into(),
            multiple_lines: "No".into(),
            internet_service: "Fiber optic".into(),
            online_security: "No".into(),
            online_backup: "Yes".into(),
            device_protection: "No".into(),
            tech_support: "No".into(),
            streaming_tv: "Yes".into(),
            streaming_movies: "No".into(),
            contract: "Month-to-month".into(),
            paperless_billing: "Yes".into(),
            payment_method: "Electronic check".into(),
            monthly_charges: 85.5,
            total_charges: 1026.0,
        }
    }
}
