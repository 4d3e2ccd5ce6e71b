//! Event shapes: the declared fields of each hook event and how extensions
//! may touch them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value kind a payload field carries across the boundary.
///
/// `null` is accepted for every kind and means "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Int,
    Float,
    Bool,
    String,
    /// Array of any values.
    Array,
    /// Array whose every element is a string.
    StringArray,
    Object,
    /// Opaque to the engine; any value is accepted.
    Any,
}

impl FieldKind {
    /// Whether `value` may be stored in a field of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            Self::Int => value.is_i64(),
            Self::Float => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::String => value.is_string(),
            Self::Array => value.is_array(),
            Self::StringArray => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    /// Short name used in error messages and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array => "array",
            Self::StringArray => "array<string>",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describe the runtime kind of a JSON value, for error messages.
pub fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() => "int",
        Value::Number(n) if n.is_u64() => "unsigned int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// What an extension listener may do with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    /// Visible to listeners, writes are rejected.
    ReadOnly,
    /// Visible and writable.
    ReadWrite,
    /// Host-only; never marshalled to listeners.
    Hidden,
}

impl FieldAccess {
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }

    pub fn is_writable(&self) -> bool {
        matches!(self, Self::ReadWrite)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::ReadWrite => "read-write",
            Self::Hidden => "hidden",
        }
    }
}

/// A single declared payload field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// The external (camelCase) field name.
    pub name: String,
    pub kind: FieldKind,
    pub access: FieldAccess,
}

/// The declared shape of a hook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Unique event name, e.g. `PreUpdateEntryProgressEvent`.
    pub name: String,
    /// Declared fields in declaration order.
    pub fields: Vec<FieldSpec>,
    /// Whether listeners may call `preventDefault()`.
    pub prevent_default: bool,
    /// Optional human-readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EventDefinition {
    /// Start building a definition for `name`.
    pub fn builder(name: impl Into<String>) -> EventDefinitionBuilder {
        EventDefinitionBuilder {
            definition: EventDefinition {
                name: name.into(),
                fields: Vec::new(),
                prevent_default: false,
                description: None,
            },
        }
    }

    /// Look up a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields that are marshalled to listeners.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.access.is_visible())
    }

    /// Two definitions describe the same event if names, fields and the
    /// `preventDefault` capability match. Descriptions are ignored.
    pub fn same_shape(&self, other: &EventDefinition) -> bool {
        self.name == other.name
            && self.prevent_default == other.prevent_default
            && self.fields == other.fields
    }

    /// Check the definition is well formed.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("event name must not be empty".to_string());
        }
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(format!("field #{index} has an empty name"));
            }
            if self.fields[..index].iter().any(|f| f.name == field.name) {
                return Err(format!("field '{}' is declared twice", field.name));
            }
        }
        Ok(())
    }
}

/// Builder for [`EventDefinition`].
#[derive(Debug, Clone)]
pub struct EventDefinitionBuilder {
    definition: EventDefinition,
}

impl EventDefinitionBuilder {
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind, access: FieldAccess) -> Self {
        self.definition.fields.push(FieldSpec {
            name: name.into(),
            kind,
            access,
        });
        self
    }

    pub fn prevent_default(mut self, supported: bool) -> Self {
        self.definition.prevent_default = supported;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = Some(description.into());
        self
    }

    pub fn build(self) -> EventDefinition {
        self.definition
    }
}
