//! Native extensions: Rust code compiled into the host that binds
//! listeners through a setup closure.

use async_trait::async_trait;

use kura_core::AppResult;

use crate::error::HookResult;
use crate::manager::HookBinder;
use crate::registry::{Extension, ExtensionInfo};

type Setup = Box<dyn Fn(&HookBinder) -> HookResult<()> + Send + Sync>;

/// An extension whose listeners are bound by a closure on every load.
pub struct NativeExtension {
    info: ExtensionInfo,
    setup: Setup,
}

impl NativeExtension {
    pub fn new<F>(id: impl Into<String>, setup: F) -> Self
    where
        F: Fn(&HookBinder) -> HookResult<()> + Send + Sync + 'static,
    {
        let id = id.into();
        Self {
            info: ExtensionInfo {
                name: id.clone(),
                id,
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: String::new(),
                author: String::new(),
                language: "native".to_string(),
            },
            setup: Box::new(setup),
        }
    }

    pub fn with_info(mut self, info: ExtensionInfo) -> Self {
        self.info = info;
        self
    }
}

impl std::fmt::Debug for NativeExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeExtension")
            .field("id", &self.info.id)
            .finish()
    }
}

#[async_trait]
impl Extension for NativeExtension {
    fn info(&self) -> ExtensionInfo {
        self.info.clone()
    }

    async fn on_load(&self, binder: &HookBinder) -> AppResult<()> {
        (self.setup)(binder)?;
        Ok(())
    }
}
