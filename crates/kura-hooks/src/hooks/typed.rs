//! Strongly typed events for host call sites.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::hooks::definitions::EventDefinition;

/// A Rust struct that mirrors the shape of one hook event.
///
/// Usually generated with [`hook_event!`](crate::hook_event).
pub trait HookEventType: Serialize + DeserializeOwned + Send + 'static {
    /// The event name listeners bind to.
    const NAME: &'static str;

    /// The declared shape, used to define the event on first trigger.
    fn definition() -> EventDefinition;
}

/// The result of triggering a typed event.
///
/// Call sites branch on [`default_prevented`](Self::default_prevented):
/// when set, the payload's writable fields hold the listener-provided
/// result and the host's own logic must be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Triggered<E> {
    event: E,
    default_prevented: bool,
    faults: usize,
}

/// A triggered event split by whether the default was prevented.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<E> {
    /// A listener took over; use the payload as the result.
    Prevented(E),
    /// Run the default behavior with the (possibly modified) payload.
    Proceed(E),
}

impl<E> Triggered<E> {
    pub(crate) fn new(event: E, default_prevented: bool, faults: usize) -> Self {
        Self {
            event,
            default_prevented,
            faults,
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    pub fn into_event(self) -> E {
        self.event
    }

    /// Number of listeners that faulted during the dispatch.
    pub fn fault_count(&self) -> usize {
        self.faults
    }

    pub fn outcome(self) -> Outcome<E> {
        if self.default_prevented {
            Outcome::Prevented(self.event)
        } else {
            Outcome::Proceed(self.event)
        }
    }
}
