//! CSV loading and saving

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// CSV loader for customer tables
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self
    }

    /// Load a CSV file with a header row.
    ///
    /// The whole file is scanned for schema inference, so a blank `TotalCharges`
    /// deep in the file still yields a text column. A missing file is reported
    /// as a missing resource rather than an IO error.
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(ChurnError::missing_dataset(path));
        }

        let start = Instant::now();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
            .finish()?;

        info!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "loaded csv"
        );
        Ok(df)
    }
}

/// Save frames to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV with a header row, creating parent directories
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| ChurnError::DataError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_missing_resource() {
        let err = DataLoader::new()
            .load_csv(Path::new("/nonexistent/telco.csv"))
            .unwrap_err();
        assert!(err.is_missing_resource());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let mut df = df!(
            "tenure" => &[1.0, 2.0],
            "Contract" => &["One year", "Two year"]
        )
        .unwrap();
        DataSaver::save_csv(&mut df, &path).unwrap();

        let loaded = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(loaded.height(), 2);
        assert_eq!(loaded.width(), 2);
    }

    #[test]
    fn test_late_blank_charge_keeps_text_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charges.csv");

        let mut charges: Vec<String> = (0..500).map(|i| format!("{}.5", i)).collect();
        charges.push(" ".to_string());
        let mut df = df!("TotalCharges" => charges).unwrap();
        DataSaver::save_csv(&mut df, &path).unwrap();

        let loaded = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(loaded.height(), 501);
        assert_eq!(loaded.column("TotalCharges").unwrap().dtype(), &DataType::String);
    }
}
