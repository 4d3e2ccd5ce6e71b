//! Event payloads: the host-owned [`HookEvent`] and the per-listener
//! [`EventView`] that crosses the runtime boundary.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::MarshalError;
use crate::hooks::definitions::{EventDefinition, FieldSpec, describe_value};

/// A mutable event payload owned by the host for the duration of a dispatch.
///
/// Fields are keyed by their external (camelCase) names. Fields the event's
/// definition does not declare are kept but never shown to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct HookEvent {
    name: String,
    fields: Map<String, Value>,
    tags: Vec<String>,
    default_prevented: bool,
    cursor: usize,
}

impl HookEvent {
    /// Creates an empty payload for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_fields(name, Map::new())
    }

    /// Creates a payload from an existing field map.
    pub fn from_fields(name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            fields,
            tags: Vec::new(),
            default_prevented: false,
            cursor: 0,
        }
    }

    /// Sets a field, builder style.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attaches dispatch tags. Tagged listeners only run when a tag matches.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Host-side write. Not subject to field access rules.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether any listener called `preventDefault()`. Never reset once set.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// How many listeners signalled `next()` during the dispatch.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Renders the payload plus dispatch state as JSON.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("event".to_string(), Value::String(self.name.clone()));
        out.insert("fields".to_string(), Value::Object(self.fields.clone()));
        out.insert(
            "defaultPrevented".to_string(),
            Value::Bool(self.default_prevented),
        );
        Value::Object(out)
    }

    /// Projects the payload into the copy a listener is allowed to see.
    pub(crate) fn view(&self, definition: &Arc<EventDefinition>) -> EventView {
        let fields = definition
            .visible_fields()
            .filter_map(|spec| {
                self.fields
                    .get(&spec.name)
                    .map(|value| (spec.name.clone(), value.clone()))
            })
            .collect();
        EventView {
            definition: definition.clone(),
            fields,
            already_prevented: self.default_prevented,
            signals: Signals::default(),
        }
    }

    /// Applies a successful listener's writable fields and signals.
    pub(crate) fn commit(&mut self, view: EventView) -> Signals {
        let EventView {
            definition,
            fields,
            signals,
            ..
        } = view;
        for (key, value) in fields {
            let writable = definition
                .field(&key)
                .is_some_and(|spec| spec.access.is_writable());
            if writable {
                self.fields.insert(key, value);
            }
        }
        if signals.default_prevented {
            self.default_prevented = true;
        }
        if signals.next_called {
            self.cursor += 1;
        }
        signals
    }
}

/// Control signals a listener raised during one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub next_called: bool,
    pub default_prevented: bool,
}

impl Signals {
    /// Neither `next()` nor `preventDefault()` was called.
    pub fn is_silent(&self) -> bool {
        !self.next_called && !self.default_prevented
    }
}

/// The listener-side copy of an event.
///
/// Only declared, non-hidden fields are present. Writes are checked against
/// the field's access and kind at the time they are made.
#[derive(Debug, Clone)]
pub struct EventView {
    definition: Arc<EventDefinition>,
    fields: Map<String, Value>,
    already_prevented: bool,
    signals: Signals,
}

impl EventView {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &EventDefinition {
        &self.definition
    }

    /// Reads a field. Declared but unset fields read as `null`.
    pub fn get(&self, key: &str) -> Result<Value, MarshalError> {
        self.check_visible(key)?;
        Ok(self.fields.get(key).cloned().unwrap_or(Value::Null))
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Writes a field if it is declared, writable, and the value fits its kind.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), MarshalError> {
        let value = value.into();
        let spec = self.check_visible(key)?;
        if !spec.access.is_writable() {
            return Err(MarshalError::ReadOnlyField {
                event: self.definition.name.clone(),
                field: key.to_string(),
            });
        }
        if !spec.kind.accepts(&value) {
            return Err(MarshalError::TypeMismatch {
                event: self.definition.name.clone(),
                field: key.to_string(),
                expected: spec.kind,
                found: describe_value(&value),
            });
        }
        self.fields.insert(key.to_string(), value);
        Ok(())
    }

    /// Signals that the listener is done. Advisory: later listeners run regardless.
    pub fn next(&mut self) {
        self.signals.next_called = true;
    }

    /// Asks the host to skip its default behavior.
    pub fn prevent_default(&mut self) -> Result<(), MarshalError> {
        if !self.definition.prevent_default {
            return Err(MarshalError::PreventDefaultUnsupported {
                event: self.definition.name.clone(),
            });
        }
        self.signals.default_prevented = true;
        Ok(())
    }

    /// True if this or an earlier listener prevented the default.
    pub fn is_default_prevented(&self) -> bool {
        self.already_prevented || self.signals.default_prevented
    }

    pub fn signals(&self) -> Signals {
        self.signals
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn check_visible(&self, key: &str) -> Result<&FieldSpec, MarshalError> {
        self.definition
            .field(key)
            .filter(|spec| spec.access.is_visible())
            .ok_or_else(|| MarshalError::UnknownField {
                event: self.definition.name.clone(),
                field: key.to_string(),
            })
    }
}
