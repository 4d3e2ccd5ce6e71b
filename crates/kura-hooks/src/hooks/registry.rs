//! Hook listener table: event name to the ordered chain of registrations.
//!
//! Chains are stored as immutable `Arc<[Registration]>` slices and replaced
//! wholesale on every mutation, so a dispatch iterates a stable snapshot
//! while registrations change underneath it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::HookResult;
use crate::hooks::catalog::EventCatalog;
use crate::runtime::listener::HookListener;

/// Process-unique registration identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationId(pub u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned by registration; pass back to [`HookRegistry::unbind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationHandle {
    pub id: RegistrationId,
    pub event: String,
    pub extension_id: String,
}

/// A listener waiting to be registered.
#[derive(Clone)]
pub struct Binding {
    pub event: String,
    pub tags: Vec<String>,
    pub listener: Arc<dyn HookListener>,
}

impl Binding {
    pub fn new(event: impl Into<String>, listener: Arc<dyn HookListener>) -> Self {
        Self {
            event: event.into(),
            tags: Vec::new(),
            listener,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("event", &self.event)
            .field("tags", &self.tags)
            .finish()
    }
}

/// One entry in an event's listener chain.
#[derive(Clone)]
pub struct Registration {
    pub id: RegistrationId,
    pub event: String,
    pub extension_id: String,
    /// Empty means the listener runs for every dispatch of the event.
    pub tags: Vec<String>,
    pub listener: Arc<dyn HookListener>,
}

impl Registration {
    /// Whether this registration should run for a dispatch carrying `tags`.
    pub fn matches_tags(&self, tags: &[String]) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|t| tags.contains(t))
    }

    pub fn handle(&self) -> RegistrationHandle {
        RegistrationHandle {
            id: self.id,
            event: self.event.clone(),
            extension_id: self.extension_id.clone(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("extension_id", &self.extension_id)
            .field("tags", &self.tags)
            .field("listener", &self.listener)
            .finish()
    }
}

/// Registry of hook listeners organized by event name.
pub struct HookRegistry {
    catalog: Arc<EventCatalog>,
    /// Event name → registration chain in registration order.
    chains: RwLock<HashMap<String, Arc<[Registration]>>>,
    next_id: AtomicU64,
}

impl HookRegistry {
    pub fn new(catalog: Arc<EventCatalog>) -> Self {
        Self {
            catalog,
            chains: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn catalog(&self) -> &Arc<EventCatalog> {
        &self.catalog
    }

    /// Appends a listener to the end of `event`'s chain.
    ///
    /// The same listener may be registered more than once; each registration
    /// runs separately.
    pub async fn register(
        &self,
        event: &str,
        extension_id: &str,
        listener: Arc<dyn HookListener>,
    ) -> HookResult<RegistrationHandle> {
        self.register_tagged(event, extension_id, Vec::new(), listener)
            .await
    }

    /// Appends a listener that only runs for dispatches carrying one of `tags`.
    pub async fn register_tagged(
        &self,
        event: &str,
        extension_id: &str,
        tags: Vec<String>,
        listener: Arc<dyn HookListener>,
    ) -> HookResult<RegistrationHandle> {
        let mut handles = self
            .register_all(
                extension_id,
                vec![Binding::new(event, listener).with_tags(tags)],
            )
            .await?;
        Ok(handles.remove(0))
    }

    /// Registers a batch of bindings under one write lock.
    ///
    /// Every event name is checked first; if any is unknown nothing is
    /// registered.
    pub async fn register_all(
        &self,
        extension_id: &str,
        bindings: Vec<Binding>,
    ) -> HookResult<Vec<RegistrationHandle>> {
        for binding in &bindings {
            self.catalog.resolve(&binding.event)?;
        }

        let mut chains = self.chains.write().await;
        let mut handles = Vec::with_capacity(bindings.len());

        for binding in bindings {
            let registration = Registration {
                id: RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed)),
                event: binding.event,
                extension_id: extension_id.to_string(),
                tags: binding.tags,
                listener: binding.listener,
            };
            handles.push(registration.handle());

            let chain = chains
                .entry(registration.event.clone())
                .or_insert_with(|| Arc::from(Vec::new()));
            let mut next: Vec<Registration> = chain.iter().cloned().collect();

            debug!(
                event = %registration.event,
                extension_id = %extension_id,
                registration_id = %registration.id,
                position = next.len(),
                "Hook listener registered"
            );
            next.push(registration);
            *chain = next.into();
        }

        Ok(handles)
    }

    /// Removes a single registration. Returns it if it was still present.
    pub async fn unbind(&self, handle: &RegistrationHandle) -> Option<Registration> {
        let mut chains = self.chains.write().await;
        let chain = chains.get_mut(&handle.event)?;

        let position = chain.iter().position(|r| r.id == handle.id)?;
        let mut next: Vec<Registration> = chain.iter().cloned().collect();
        let removed = next.remove(position);

        if next.is_empty() {
            chains.remove(&handle.event);
        } else {
            *chain = next.into();
        }

        debug!(
            event = %handle.event,
            registration_id = %handle.id,
            "Hook listener unbound"
        );
        Some(removed)
    }

    /// Removes every registration owned by `extension_id` and returns them.
    pub async fn unregister_extension(&self, extension_id: &str) -> Vec<Registration> {
        let mut chains = self.chains.write().await;
        let mut removed = Vec::new();

        for chain in chains.values_mut() {
            if !chain.iter().any(|r| r.extension_id == extension_id) {
                continue;
            }
            let (gone, kept): (Vec<Registration>, Vec<Registration>) = chain
                .iter()
                .cloned()
                .partition(|r| r.extension_id == extension_id);
            removed.extend(gone);
            *chain = kept.into();
        }

        chains.retain(|_, chain| !chain.is_empty());

        info!(
            extension_id = %extension_id,
            removed = removed.len(),
            "All hook listeners unregistered for extension"
        );
        removed
    }

    /// Snapshot of `event`'s chain, or `None` when nothing is registered.
    pub async fn listeners_for(&self, event: &str) -> Option<Arc<[Registration]>> {
        let chains = self.chains.read().await;
        chains.get(event).cloned()
    }

    pub async fn listener_count(&self, event: &str) -> usize {
        let chains = self.chains.read().await;
        chains.get(event).map(|chain| chain.len()).unwrap_or(0)
    }

    /// Event names that currently have at least one listener, sorted.
    pub async fn registered_events(&self) -> Vec<String> {
        let chains = self.chains.read().await;
        let mut names: Vec<String> = chains.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use crate::runtime::listener::ClosureListener;

    fn noop() -> Arc<dyn HookListener> {
        ClosureListener::shared("noop", |event| {
            event.next();
            Ok(())
        })
    }

    fn registry() -> HookRegistry {
        HookRegistry::new(Arc::new(EventCatalog::with_builtin_events().unwrap()))
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_event() {
        let registry = registry();
        let err = registry.register("Nope", "ext", noop()).await.unwrap_err();
        assert!(matches!(err, HookError::UnknownEvent(_)));
        assert!(registry.registered_events().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_all_is_atomic() {
        let registry = registry();
        let result = registry
            .register_all(
                "ext",
                vec![
                    Binding::new("ScanStartedEvent", noop()),
                    Binding::new("Missing", noop()),
                ],
            )
            .await;
        assert!(result.is_err());
        assert_eq!(registry.listener_count("ScanStartedEvent").await, 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_across_mutation() {
        let registry = registry();
        let handle = registry
            .register("ScanStartedEvent", "ext", noop())
            .await
            .unwrap();

        let snapshot = registry.listeners_for("ScanStartedEvent").await.unwrap();
        registry.unbind(&handle).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(registry.listeners_for("ScanStartedEvent").await.is_none());
    }

    #[tokio::test]
    async fn test_ids_are_monotonic_and_duplicates_kept() {
        let registry = registry();
        let listener = noop();
        let a = registry
            .register("ScanStartedEvent", "ext", listener.clone())
            .await
            .unwrap();
        let b = registry
            .register("ScanStartedEvent", "ext", listener)
            .await
            .unwrap();
        assert!(a.id < b.id);
        assert_eq!(registry.listener_count("ScanStartedEvent").await, 2);
    }

    #[test]
    fn test_untagged_registration_matches_everything() {
        let registration = Registration {
            id: RegistrationId(1),
            event: "ScanStartedEvent".to_string(),
            extension_id: "ext".to_string(),
            tags: Vec::new(),
            listener: noop(),
        };
        assert!(registration.matches_tags(&[]));
        assert!(registration.matches_tags(&["anime".to_string()]));

        let tagged = Registration {
            tags: vec!["manga".to_string()],
            ..registration
        };
        assert!(!tagged.matches_tags(&[]));
        assert!(!tagged.matches_tags(&["anime".to_string()]));
        assert!(tagged.matches_tags(&["manga".to_string()]));
    }
}
