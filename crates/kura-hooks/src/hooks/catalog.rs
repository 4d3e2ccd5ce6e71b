//! Event catalog: the set of event names known to the process and their shapes.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::error::{HookError, HookResult};
use crate::events;
use crate::hooks::definitions::EventDefinition;
use crate::hooks::typed::HookEventType;

/// Registry of event definitions, keyed by event name.
///
/// Definitions are immutable once inserted. Defining the same name twice is
/// accepted only when the shapes are identical.
#[derive(Debug, Default)]
pub struct EventCatalog {
    definitions: DashMap<String, Arc<EventDefinition>>,
}

impl EventCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog pre-populated with every built-in host event.
    pub fn with_builtin_events() -> HookResult<Self> {
        let catalog = Self::new();
        for definition in events::builtin_definitions() {
            catalog.define(definition)?;
        }
        debug!(count = catalog.len(), "Built-in hook events defined");
        Ok(catalog)
    }

    /// Adds a definition, or returns the existing one when the shape matches.
    pub fn define(&self, definition: EventDefinition) -> HookResult<Arc<EventDefinition>> {
        definition
            .validate()
            .map_err(|reason| HookError::InvalidDefinition {
                name: definition.name.clone(),
                reason,
            })?;

        match self.definitions.entry(definition.name.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().same_shape(&definition) {
                    Ok(existing.get().clone())
                } else {
                    Err(HookError::ConflictingDefinition {
                        name: definition.name,
                    })
                }
            }
            Entry::Vacant(slot) => {
                debug!(
                    event = %definition.name,
                    fields = definition.fields.len(),
                    prevent_default = definition.prevent_default,
                    "Hook event defined"
                );
                let definition = Arc::new(definition);
                slot.insert(definition.clone());
                Ok(definition)
            }
        }
    }

    /// Defines the event described by a typed payload struct.
    ///
    /// An existing entry is reused only if its shape matches the struct's.
    pub fn define_type<E: HookEventType>(&self) -> HookResult<Arc<EventDefinition>> {
        let definition = E::definition();
        match self.get(E::NAME) {
            Some(existing) if existing.same_shape(&definition) => Ok(existing),
            Some(_) => Err(HookError::ConflictingDefinition {
                name: E::NAME.to_string(),
            }),
            None => self.define(definition),
        }
    }

    /// Looks up a definition, failing with [`HookError::UnknownEvent`].
    pub fn resolve(&self, name: &str) -> HookResult<Arc<EventDefinition>> {
        self.get(name)
            .ok_or_else(|| HookError::UnknownEvent(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Arc<EventDefinition>> {
        self.definitions.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// All event names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.definitions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// All definitions, sorted by name.
    pub fn definitions(&self) -> Vec<Arc<EventDefinition>> {
        let mut defs: Vec<Arc<EventDefinition>> =
            self.definitions.iter().map(|e| e.value().clone()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::definitions::{FieldAccess, FieldKind};

    fn scan_started() -> EventDefinition {
        EventDefinition::builder("CustomScanEvent")
            .field("libraryPath", FieldKind::String, FieldAccess::ReadWrite)
            .prevent_default(true)
            .build()
    }

    #[test]
    fn test_define_is_idempotent_for_identical_shape() {
        let catalog = EventCatalog::new();
        let first = catalog.define(scan_started()).unwrap();
        let second = catalog.define(scan_started()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_define_rejects_conflicting_shape() {
        let catalog = EventCatalog::new();
        catalog.define(scan_started()).unwrap();

        let conflicting = EventDefinition::builder("CustomScanEvent")
            .field("libraryPath", FieldKind::String, FieldAccess::ReadOnly)
            .prevent_default(true)
            .build();
        let err = catalog.define(conflicting).unwrap_err();
        assert!(matches!(err, HookError::ConflictingDefinition { .. }));
    }

    crate::hook_event! {
        struct MistypedScanEvent => "ScanStartedEvent", prevent_default = false {
            library_path: i64 => ("libraryPath", Int, ReadOnly),
        }
    }

    crate::hook_event! {
        struct CustomScanEvent => "CustomScanEvent", prevent_default = true {
            library_path: String => ("libraryPath", String, ReadWrite),
        }
    }

    #[test]
    fn test_define_type_rejects_shape_that_conflicts_with_catalog() {
        let catalog = EventCatalog::with_builtin_events().unwrap();
        let err = catalog.define_type::<MistypedScanEvent>().unwrap_err();
        assert!(matches!(err, HookError::ConflictingDefinition { name } if name == "ScanStartedEvent"));
    }

    #[test]
    fn test_define_type_reuses_matching_definition() {
        let catalog = EventCatalog::new();
        let defined = catalog.define(scan_started()).unwrap();
        let typed = catalog.define_type::<CustomScanEvent>().unwrap();
        assert!(Arc::ptr_eq(&defined, &typed));

        let builtin = EventCatalog::with_builtin_events().unwrap();
        builtin
            .define_type::<crate::events::ScanStartedEvent>()
            .unwrap();
    }

    #[test]
    fn test_resolve_unknown_event() {
        let catalog = EventCatalog::new();
        let err = catalog.resolve("Nope").unwrap_err();
        assert!(matches!(err, HookError::UnknownEvent(name) if name == "Nope"));
    }

    #[test]
    fn test_builtin_catalog_contains_core_events() {
        let catalog = EventCatalog::with_builtin_events().unwrap();
        assert!(catalog.contains("PreUpdateEntryProgressEvent"));
        assert!(catalog.contains("ScanStartedEvent"));
        let names = catalog.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
