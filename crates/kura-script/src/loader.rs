//! Loads every extension manifest found in a directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use kura_core::config::AppConfig;
use kura_hooks::ExtensionManager;

use crate::error::ScriptError;
use crate::extension::ScriptExtension;

/// What happened while loading a directory.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadReport {
    /// Ids of the extensions that loaded.
    pub loaded: Vec<String>,
    /// Manifests that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Discovers `*.json` manifests and loads them into a manager.
#[derive(Debug, Clone)]
pub struct ExtensionLoader {
    directory: PathBuf,
    config: AppConfig,
}

impl ExtensionLoader {
    pub fn new(directory: impl Into<PathBuf>, config: AppConfig) -> Self {
        Self {
            directory: directory.into(),
            config,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.extensions.directory, config.clone())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Manifest paths in the directory, sorted. A missing directory is empty.
    pub fn discover(&self) -> Result<Vec<PathBuf>, ScriptError> {
        if !self.directory.exists() {
            warn!(directory = %self.directory.display(), "Extension directory does not exist");
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.directory).map_err(|source| ScriptError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let mut manifests = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ScriptError::Io {
                path: self.directory.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                manifests.push(path);
            }
        }
        manifests.sort();
        Ok(manifests)
    }

    pub fn load_file(&self, path: &Path) -> Result<ScriptExtension, ScriptError> {
        ScriptExtension::from_manifest_file(path, &self.config)
    }

    /// Loads every discovered extension. Bad manifests and failing scripts
    /// are logged and skipped.
    pub async fn load_all(&self, manager: &ExtensionManager) -> Result<LoadReport, ScriptError> {
        let mut report = LoadReport::default();

        for path in self.discover()? {
            let extension = match self.load_file(&path) {
                Ok(extension) => extension,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping invalid extension manifest");
                    report.failed.push((path, e.to_string()));
                    continue;
                }
            };

            let id = extension.manifest().id.clone();
            match manager.load(Arc::new(extension)).await {
                Ok(_) => report.loaded.push(id),
                Err(e) => {
                    error!(extension_id = %id, error = %e, "Failed to load extension");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            directory = %self.directory.display(),
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Extension directory loaded"
        );
        Ok(report)
    }
}
