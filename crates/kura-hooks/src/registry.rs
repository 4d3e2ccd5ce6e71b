//! Extension registry: loaded extension instances, their metadata and
//! their recent listener faults.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use kura_core::AppResult;

use crate::error::{HookError, HookResult, ListenerFault};
use crate::hooks::dispatcher::FaultReporter;
use crate::manager::HookBinder;

/// Metadata about an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    /// Unique extension identifier.
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    /// Runtime the extension runs in, e.g. `native` or `rhai`.
    pub language: String,
}

/// Trait that all extensions implement.
#[async_trait]
pub trait Extension: Send + Sync + std::fmt::Debug {
    fn info(&self) -> ExtensionInfo;

    /// Called when the extension is loaded. Listeners bound through `binder`
    /// are registered only if this returns `Ok`.
    async fn on_load(&self, binder: &HookBinder) -> AppResult<()>;

    /// Called after the extension's listeners have been removed.
    async fn on_unload(&self) -> AppResult<()> {
        Ok(())
    }
}

/// A listener fault attributed to an extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultRecord {
    pub event: String,
    pub fault: String,
    pub occurred_at: DateTime<Utc>,
}

/// Snapshot of a loaded extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionStatus {
    pub info: ExtensionInfo,
    pub loaded_at: DateTime<Utc>,
    pub listener_count: usize,
    /// Faults since load, including ones evicted from `recent_faults`.
    pub fault_count: u64,
    pub recent_faults: Vec<FaultRecord>,
}

struct Entry {
    extension: Arc<dyn Extension>,
    info: ExtensionInfo,
    loaded_at: DateTime<Utc>,
    listener_count: usize,
    fault_count: u64,
    faults: VecDeque<FaultRecord>,
}

impl Entry {
    fn status(&self) -> ExtensionStatus {
        ExtensionStatus {
            info: self.info.clone(),
            loaded_at: self.loaded_at,
            listener_count: self.listener_count,
            fault_count: self.fault_count,
            recent_faults: self.faults.iter().cloned().collect(),
        }
    }
}

/// Registry of all loaded extensions.
pub struct ExtensionRegistry {
    entries: RwLock<HashMap<String, Entry>>,
    fault_history: usize,
}

impl ExtensionRegistry {
    /// Creates an empty registry keeping up to `fault_history` faults per extension.
    pub fn new(fault_history: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fault_history,
        }
    }

    pub fn register(&self, extension: Arc<dyn Extension>, listener_count: usize) -> HookResult<()> {
        let info = extension.info();
        let mut entries = self.entries.write();

        if entries.contains_key(&info.id) {
            return Err(HookError::DuplicateExtension(info.id));
        }

        info!(
            extension_id = %info.id,
            name = %info.name,
            version = %info.version,
            "Registering extension"
        );

        entries.insert(
            info.id.clone(),
            Entry {
                extension,
                info,
                loaded_at: Utc::now(),
                listener_count,
                fault_count: 0,
                faults: VecDeque::new(),
            },
        );
        Ok(())
    }

    pub fn unregister(&self, extension_id: &str) -> HookResult<Arc<dyn Extension>> {
        let mut entries = self.entries.write();
        let entry = entries
            .remove(extension_id)
            .ok_or_else(|| HookError::ExtensionNotFound(extension_id.to_string()))?;

        info!(extension_id = %extension_id, "Extension unregistered");
        Ok(entry.extension)
    }

    pub fn get(&self, extension_id: &str) -> Option<Arc<dyn Extension>> {
        self.entries
            .read()
            .get(extension_id)
            .map(|entry| entry.extension.clone())
    }

    pub fn contains(&self, extension_id: &str) -> bool {
        self.entries.read().contains_key(extension_id)
    }

    pub fn status(&self, extension_id: &str) -> Option<ExtensionStatus> {
        self.entries.read().get(extension_id).map(Entry::status)
    }

    /// Every loaded extension, oldest first.
    pub fn list(&self) -> Vec<ExtensionStatus> {
        let entries = self.entries.read();
        let mut statuses: Vec<ExtensionStatus> = entries.values().map(Entry::status).collect();
        statuses.sort_by(|a, b| {
            a.loaded_at
                .cmp(&b.loaded_at)
                .then_with(|| a.info.id.cmp(&b.info.id))
        });
        statuses
    }

    pub fn faults(&self, extension_id: &str) -> Vec<FaultRecord> {
        self.entries
            .read()
            .get(extension_id)
            .map(|entry| entry.faults.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.entries.read().len()
    }
}

impl FaultReporter for ExtensionRegistry {
    fn report(&self, extension_id: &str, event: &str, fault: &ListenerFault) {
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(extension_id) else {
            debug!(extension_id = %extension_id, "Fault reported for unknown extension");
            return;
        };

        entry.fault_count += 1;
        if self.fault_history == 0 {
            return;
        }
        if entry.faults.len() == self.fault_history {
            entry.faults.pop_front();
        }
        entry.faults.push_back(FaultRecord {
            event: event.to_string(),
            fault: fault.to_string(),
            occurred_at: Utc::now(),
        });
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("count", &self.count())
            .field("fault_history", &self.fault_history)
            .finish()
    }
}
