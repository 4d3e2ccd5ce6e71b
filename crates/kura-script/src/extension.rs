//! Script-backed extensions.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use kura_core::config::AppConfig;
use kura_core::config::extensions::SandboxConfig;
use kura_core::{AppError, AppResult};
use kura_hooks::{Extension, ExtensionInfo, HookBinder};

use crate::error::ScriptError;
use crate::listener::ScriptListener;
use crate::manifest::ExtensionManifest;
use crate::runtime::ScriptRuntime;

/// An extension whose listeners are defined by a Rhai script.
///
/// The script is compiled afresh on every load, so reloading picks up a
/// clean engine and new listeners.
pub struct ScriptExtension {
    manifest: ExtensionManifest,
    source: String,
    sandbox: SandboxConfig,
    load_timeout: Duration,
    runtime: Mutex<Option<Arc<ScriptRuntime>>>,
}

impl ScriptExtension {
    pub fn new(
        manifest: ExtensionManifest,
        source: impl Into<String>,
        sandbox: SandboxConfig,
        load_timeout: Duration,
    ) -> Self {
        Self {
            manifest,
            source: source.into(),
            sandbox,
            load_timeout,
            runtime: Mutex::new(None),
        }
    }

    /// Reads a manifest file and the script it points to.
    pub fn from_manifest_file(path: &Path, config: &AppConfig) -> Result<Self, ScriptError> {
        let manifest = ExtensionManifest::from_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let source = manifest.resolve_source(base_dir)?;
        Ok(Self::new(
            manifest,
            source,
            config.extensions.sandbox.clone(),
            config.hooks.listener_timeout(),
        ))
    }

    pub fn manifest(&self) -> &ExtensionManifest {
        &self.manifest
    }

    pub fn is_loaded(&self) -> bool {
        self.runtime.lock().is_some()
    }
}

#[async_trait]
impl Extension for ScriptExtension {
    fn info(&self) -> ExtensionInfo {
        self.manifest.info()
    }

    async fn on_load(&self, binder: &HookBinder) -> AppResult<()> {
        let id = self.manifest.id.clone();
        let source = self.source.clone();
        let sandbox = self.sandbox.clone();
        let catalog = binder.catalog().clone();
        let deadline = Instant::now() + self.load_timeout;

        let loaded = tokio::task::spawn_blocking(move || {
            ScriptRuntime::load(&id, &source, &sandbox, catalog, deadline)
        })
        .await
        .map_err(|e| AppError::internal(format!("Script load task failed: {e}")))??;

        for binding in &loaded.bindings {
            let listener = Arc::new(ScriptListener::new(loaded.runtime.clone(), binding));
            binder.bind_tagged(&binding.event, binding.tags.clone(), listener)?;
        }

        debug!(
            extension_id = %self.manifest.id,
            listeners = loaded.bindings.len(),
            "Script extension bound its listeners"
        );
        *self.runtime.lock() = Some(loaded.runtime);
        Ok(())
    }

    async fn on_unload(&self) -> AppResult<()> {
        self.runtime.lock().take();
        Ok(())
    }
}

impl std::fmt::Debug for ScriptExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptExtension")
            .field("id", &self.manifest.id)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
