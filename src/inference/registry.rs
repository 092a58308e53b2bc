//! Process-wide artifact registry
//!
//! Loads the model bundle, evaluation artifact and cleaned dataset on first
//! use and hands out shared `Arc`s afterwards. `invalidate` drops the cached
//! copies; `reload` drops and eagerly reloads the trained artifacts.

use crate::config::PathsConfig;
use crate::data;
use crate::error::Result;
use crate::evaluation::EvaluationArtifact;
use crate::training::ModelBundle;
use crate::utils::DataLoader;
use parking_lot::RwLock;
use polars::prelude::DataFrame;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Lazily loaded, shared artifacts for one set of paths
#[derive(Debug)]
pub struct ArtifactRegistry {
    paths: RwLock<PathsConfig>,
    model: RwLock<Option<Arc<ModelBundle>>>,
    evaluation: RwLock<Option<Arc<EvaluationArtifact>>>,
    dataset: RwLock<Option<Arc<DataFrame>>>,
}

/// Read the slot; on a miss load outside the lock and keep whichever copy landed first
fn get_or_load<T>(
    slot: &RwLock<Option<Arc<T>>>,
    load: impl FnOnce() -> Result<T>,
) -> Result<Arc<T>> {
    if let Some(cached) = slot.read().as_ref() {
        return Ok(Arc::clone(cached));
    }
    let loaded = Arc::new(load()?);
    let mut guard = slot.write();
    Ok(Arc::clone(guard.get_or_insert(loaded)))
}

impl ArtifactRegistry {
    pub fn new(paths: PathsConfig) -> Self {
        Self {
            paths: RwLock::new(paths),
            model: RwLock::new(None),
            evaluation: RwLock::new(None),
            dataset: RwLock::new(None),
        }
    }

    /// Point the registry at new locations; cached artifacts are dropped
    pub fn configure(&self, paths: PathsConfig) {
        *self.paths.write() = paths;
        self.invalidate();
    }

    pub fn paths(&self) -> PathsConfig {
        self.paths.read().clone()
    }

    /// Trained bundle; a missing file is a "run training first" error
    pub fn model(&self) -> Result<Arc<ModelBundle>> {
        let path = self.paths.read().model_path();
        get_or_load(&self.model, || ModelBundle::load(&path))
    }

    pub fn evaluation(&self) -> Result<Arc<EvaluationArtifact>> {
        let path = self.paths.read().evaluation_path();
        get_or_load(&self.evaluation, || EvaluationArtifact::load(&path))
    }

    /// Cleaned dataset: the processed CSV when present, else the raw CSV cleaned in memory
    pub fn dataset(&self) -> Result<Arc<DataFrame>> {
        let paths = self.paths();
        get_or_load(&self.dataset, || {
            if paths.processed_data.exists() {
                DataLoader::new().load_csv(&paths.processed_data)
            } else {
                data::load_and_prepare(&paths.raw_data, None)
            }
        })
    }

    /// Whether the bundle is currently cached
    pub fn is_model_loaded(&self) -> bool {
        self.model.read().is_some()
    }

    /// Drop every cached artifact; the next access reads from disk
    pub fn invalidate(&self) {
        *self.model.write() = None;
        *self.evaluation.write() = None;
        *self.dataset.write() = None;
        debug!("artifact cache invalidated");
    }

    /// Drop the cache and load the trained artifacts again
    pub fn reload(&self) -> Result<()> {
        self.invalidate();
        let model = self.model()?;
        self.evaluation()?;
        info!(model = %model.model_name(), "reloaded artifacts");
        Ok(())
    }
}

impl Default for ArtifactRegistry {
    fn default() -> Self {
        Self::new(PathsConfig::default())
    }
}

/// The process-wide registry, created with default paths on first use
pub fn registry() -> &'static ArtifactRegistry {
    static REGISTRY: OnceLock<ArtifactRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ArtifactRegistry::default)
}
