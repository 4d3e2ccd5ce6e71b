//! Error types for the hook engine.
//!
//! [`HookError`] is the only error that escapes a dispatch. Per-listener
//! problems are [`ListenerFault`]s (with [`MarshalError`] as the marshal
//! boundary case); they are absorbed by the dispatcher and only ever logged
//! and recorded.

use std::time::Duration;

use thiserror::Error;

use kura_core::error::{AppError, ErrorKind};

use crate::hooks::definitions::FieldKind;

/// Result alias for hook engine operations.
pub type HookResult<T> = Result<T, HookError>;

/// Errors surfaced to host code by the catalog, registry, dispatcher and manager.
#[derive(Debug, Clone, Error)]
pub enum HookError {
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Event '{name}' is already defined with a different shape")]
    ConflictingDefinition { name: String },

    #[error("Invalid definition for event '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Extension '{0}' is already loaded")]
    DuplicateExtension(String),

    #[error("Extension '{0}' is not loaded")]
    ExtensionNotFound(String),

    #[error("Extension '{id}' failed to load: {reason}")]
    ExtensionLoad { id: String, reason: String },

    #[error("Payload for event '{event}' could not be encoded: {reason}")]
    Serialization { event: String, reason: String },
}

/// A payload field could not cross the host/extension boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("Event '{event}' has no field '{field}'")]
    UnknownField { event: String, field: String },

    #[error("Field '{field}' of event '{event}' is read-only")]
    ReadOnlyField { event: String, field: String },

    #[error("Field '{field}' of event '{event}' expects {expected}, got {found}")]
    TypeMismatch {
        event: String,
        field: String,
        expected: FieldKind,
        found: &'static str,
    },

    #[error("Event '{event}' does not support preventDefault()")]
    PreventDefaultUnsupported { event: String },

    #[error("Field '{field}' cannot be represented in the sandbox: {reason}")]
    Unrepresentable { field: String, reason: String },

    #[error("Listener output does not fit the typed shape of event '{event}': {reason}")]
    Undecodable { event: String, reason: String },
}

/// Why a single listener invocation contributed nothing to a dispatch.
#[derive(Debug, Clone, Error)]
pub enum ListenerFault {
    #[error("listener failed: {0}")]
    Failed(String),

    #[error("listener panicked: {0}")]
    Panicked(String),

    #[error("listener timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("marshal error: {0}")]
    Marshal(#[from] MarshalError),

    #[error("listener belongs to an unloaded extension")]
    Retired,
}

impl ListenerFault {
    /// Convenience constructor for script and native listener failures.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// A timeout fault for a `budget`, saturating at `u64::MAX` milliseconds.
    pub fn timed_out(budget: Duration) -> Self {
        Self::TimedOut {
            timeout_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl From<HookError> for AppError {
    fn from(err: HookError) -> Self {
        let kind = match &err {
            HookError::UnknownEvent(_) | HookError::InvalidDefinition { .. } => ErrorKind::Hook,
            HookError::ConflictingDefinition { .. } | HookError::DuplicateExtension(_) => {
                ErrorKind::Conflict
            }
            HookError::ExtensionNotFound(_) => ErrorKind::NotFound,
            HookError::ExtensionLoad { .. } => ErrorKind::Extension,
            HookError::Serialization { .. } => ErrorKind::Serialization,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_event_maps_to_hook_kind() {
        let err: AppError = HookError::UnknownEvent("Nope".to_string()).into();
        assert_eq!(err.kind, ErrorKind::Hook);
        assert!(err.message.contains("Nope"));
    }

    #[test]
    fn test_marshal_error_converts_to_fault() {
        let fault: ListenerFault = MarshalError::PreventDefaultUnsupported {
            event: "PostUpdateEntryEvent".to_string(),
        }
        .into();
        assert!(matches!(fault, ListenerFault::Marshal(_)));
        assert!(fault.to_string().contains("preventDefault"));
    }

    #[test]
    fn test_timed_out_saturates_oversized_budgets() {
        assert!(matches!(
            ListenerFault::timed_out(Duration::from_millis(250)),
            ListenerFault::TimedOut { timeout_ms: 250 }
        ));
        assert!(matches!(
            ListenerFault::timed_out(Duration::MAX),
            ListenerFault::TimedOut { timeout_ms: u64::MAX }
        ));
    }
}
