//! Extension manager: lifecycle management for all extensions.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{error, info, warn};

use kura_core::AppResult;
use kura_core::config::hooks::HookConfig;

use crate::error::{HookError, HookResult, ListenerFault};
use crate::hooks::catalog::EventCatalog;
use crate::hooks::dispatcher::HookDispatcher;
use crate::hooks::event::EventView;
use crate::hooks::registry::{Binding, HookRegistry, RegistrationHandle};
use crate::registry::{Extension, ExtensionRegistry, ExtensionStatus};
use crate::runtime::listener::{ClosureListener, HookListener};

/// Collects an extension's listeners while it loads.
///
/// Event names are checked against the catalog as they are bound. Nothing
/// reaches the listener table until `on_load` has returned successfully.
pub struct HookBinder {
    extension_id: String,
    catalog: Arc<EventCatalog>,
    bindings: Mutex<Vec<Binding>>,
}

impl HookBinder {
    pub fn new(extension_id: impl Into<String>, catalog: Arc<EventCatalog>) -> Self {
        Self {
            extension_id: extension_id.into(),
            catalog,
            bindings: Mutex::new(Vec::new()),
        }
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    pub fn catalog(&self) -> &Arc<EventCatalog> {
        &self.catalog
    }

    pub fn bind(&self, event: &str, listener: Arc<dyn HookListener>) -> HookResult<()> {
        self.bind_tagged(event, Vec::new(), listener)
    }

    /// Binds a listener that only runs for dispatches carrying one of `tags`.
    pub fn bind_tagged(
        &self,
        event: &str,
        tags: Vec<String>,
        listener: Arc<dyn HookListener>,
    ) -> HookResult<()> {
        self.catalog.resolve(event)?;
        self.bindings
            .lock()
            .push(Binding::new(event, listener).with_tags(tags));
        Ok(())
    }

    /// Binds a native closure.
    pub fn bind_fn<F>(&self, event: &str, callback: F) -> HookResult<()>
    where
        F: Fn(&mut EventView) -> Result<(), ListenerFault> + Send + Sync + 'static,
    {
        let name = format!("{}:{}", self.extension_id, event);
        self.bind(event, ClosureListener::shared(name, callback))
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.lock().len()
    }

    fn into_bindings(self) -> Vec<Binding> {
        self.bindings.into_inner()
    }
}

impl std::fmt::Debug for HookBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookBinder")
            .field("extension_id", &self.extension_id)
            .field("bindings", &self.binding_count())
            .finish()
    }
}

/// Manages the lifecycle of extensions: load, unload, reload.
///
/// Lifecycle operations are serialized; dispatches run concurrently with
/// them against listener snapshots.
#[derive(Debug)]
pub struct ExtensionManager {
    catalog: Arc<EventCatalog>,
    hook_registry: Arc<HookRegistry>,
    dispatcher: Arc<HookDispatcher>,
    extensions: Arc<ExtensionRegistry>,
    lifecycle: AsyncMutex<()>,
}

impl ExtensionManager {
    pub fn new(catalog: Arc<EventCatalog>, config: &HookConfig) -> Self {
        let hook_registry = Arc::new(HookRegistry::new(catalog.clone()));
        let extensions = Arc::new(ExtensionRegistry::new(config.fault_history));
        let dispatcher = Arc::new(
            HookDispatcher::new(hook_registry.clone(), config).with_reporter(extensions.clone()),
        );

        Self {
            catalog,
            hook_registry,
            dispatcher,
            extensions,
            lifecycle: AsyncMutex::new(()),
        }
    }

    /// Creates a manager whose catalog holds every built-in event.
    pub fn with_builtin_events(config: &HookConfig) -> HookResult<Self> {
        Ok(Self::new(Arc::new(EventCatalog::with_builtin_events()?), config))
    }

    /// Loads an extension and registers the listeners it binds.
    pub async fn load(&self, extension: Arc<dyn Extension>) -> AppResult<Vec<RegistrationHandle>> {
        let _guard = self.lifecycle.lock().await;
        self.load_locked(extension).await
    }

    /// Unloads an extension. Its listeners stop running immediately; an
    /// invocation already in flight is refused once it reaches the boundary.
    pub async fn unload(&self, extension_id: &str) -> AppResult<()> {
        let _guard = self.lifecycle.lock().await;
        self.unload_locked(extension_id).await
    }

    /// Unloads and loads the same extension again.
    ///
    /// Its listeners move to the end of every chain. If loading fails the
    /// extension stays unloaded.
    pub async fn reload(&self, extension_id: &str) -> AppResult<Vec<RegistrationHandle>> {
        let _guard = self.lifecycle.lock().await;
        let extension = self
            .extensions
            .get(extension_id)
            .ok_or_else(|| HookError::ExtensionNotFound(extension_id.to_string()))?;

        self.unload_locked(extension_id).await?;
        self.load_locked(extension).await
    }

    /// Loads `extension`, first unloading any extension with the same id.
    pub async fn replace(&self, extension: Arc<dyn Extension>) -> AppResult<Vec<RegistrationHandle>> {
        let _guard = self.lifecycle.lock().await;
        let id = extension.info().id;
        if self.extensions.contains(&id) {
            self.unload_locked(&id).await?;
        }
        self.load_locked(extension).await
    }

    /// Unloads every extension.
    pub async fn unload_all(&self) -> AppResult<()> {
        let _guard = self.lifecycle.lock().await;
        for status in self.extensions.list() {
            if let Err(e) = self.unload_locked(&status.info.id).await {
                error!(
                    extension_id = %status.info.id,
                    error = %e,
                    "Error unloading extension"
                );
            }
        }
        info!("All extensions unloaded");
        Ok(())
    }

    pub fn dispatcher(&self) -> &Arc<HookDispatcher> {
        &self.dispatcher
    }

    pub fn catalog(&self) -> &Arc<EventCatalog> {
        &self.catalog
    }

    pub fn hook_registry(&self) -> &Arc<HookRegistry> {
        &self.hook_registry
    }

    pub fn extensions(&self) -> &Arc<ExtensionRegistry> {
        &self.extensions
    }

    pub fn list(&self) -> Vec<ExtensionStatus> {
        self.extensions.list()
    }

    async fn load_locked(&self, extension: Arc<dyn Extension>) -> AppResult<Vec<RegistrationHandle>> {
        let info = extension.info();
        if self.extensions.contains(&info.id) {
            return Err(HookError::DuplicateExtension(info.id).into());
        }

        let binder = HookBinder::new(info.id.clone(), self.catalog.clone());
        extension.on_load(&binder).await.map_err(|e| {
            error!(extension_id = %info.id, error = %e, "Extension load failed");
            HookError::ExtensionLoad {
                id: info.id.clone(),
                reason: e.to_string(),
            }
        })?;

        let handles = self
            .hook_registry
            .register_all(&info.id, binder.into_bindings())
            .await?;

        if let Err(e) = self.extensions.register(extension, handles.len()) {
            for registration in self.hook_registry.unregister_extension(&info.id).await {
                registration.listener.retire();
            }
            return Err(e.into());
        }

        info!(
            extension_id = %info.id,
            name = %info.name,
            version = %info.version,
            language = %info.language,
            listeners = handles.len(),
            "Extension loaded"
        );
        Ok(handles)
    }

    async fn unload_locked(&self, extension_id: &str) -> AppResult<()> {
        if !self.extensions.contains(extension_id) {
            return Err(HookError::ExtensionNotFound(extension_id.to_string()).into());
        }

        let removed = self.hook_registry.unregister_extension(extension_id).await;
        for registration in &removed {
            registration.listener.retire();
        }

        let extension = self.extensions.unregister(extension_id)?;
        if let Err(e) = extension.on_unload().await {
            warn!(
                extension_id = %extension_id,
                error = %e,
                "Extension unload returned error"
            );
        }

        info!(
            extension_id = %extension_id,
            listeners = removed.len(),
            "Extension unloaded"
        );
        Ok(())
    }
}
