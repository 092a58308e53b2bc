//! Data preparation
//!
//! - [`schema`]: column names, vocabularies and the typed [`CustomerRecord`]
//! - [`cleaning`]: raw table cleaning and row-wise type normalization

pub mod cleaning;
pub mod schema;

pub use cleaning::{clean, feature_types, normalize_types, FeatureTypes};
pub use schema::{encode_labels, require_columns, CustomerRecord, REQUIRED_BASE_COLUMNS};

use crate::error::Result;
use crate::utils::{DataLoader, DataSaver};
use polars::prelude::*;
use std::path::Path;

/// Load the raw CSV, clean it, and optionally persist the cleaned table
pub fn load_and_prepare(raw_path: &Path, processed_path: Option<&Path>) -> Result<DataFrame> {
    let raw = DataLoader::new().load_csv(raw_path)?;
    let mut cleaned = clean(&raw)?;

    if let Some(out) = processed_path {
        DataSaver::save_csv(&mut cleaned, out)?;
        tracing::info!(path = %out.display(), "saved processed data");
    }
    Ok(cleaned)
}
