//! Isolation boundary around a single listener invocation.
//!
//! Each call runs on tokio's blocking pool against its own copy of the
//! event. A panic, an error or a blown deadline all become a
//! [`ListenerFault`] and leave the host payload untouched.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use kura_core::config::hooks::HookConfig;

use crate::error::ListenerFault;
use crate::hooks::definitions::EventDefinition;
use crate::hooks::event::{EventView, HookEvent};
use crate::hooks::registry::Registration;
use crate::runtime::listener::InvocationContext;

/// Outcome of one listener invocation.
#[derive(Debug)]
pub struct Invocation {
    pub outcome: Result<EventView, ListenerFault>,
    pub elapsed: Duration,
}

/// Runs listeners with a per-call deadline.
#[derive(Debug, Clone)]
pub struct RuntimeBoundary {
    timeout: Duration,
}

impl RuntimeBoundary {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &HookConfig) -> Self {
        Self::new(config.listener_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invokes one registration against a fresh view of `event`.
    ///
    /// A listener that overruns keeps its worker thread until it returns
    /// (sandboxed scripts stop themselves at the deadline); its result is
    /// dropped either way.
    pub async fn invoke(
        &self,
        registration: &Registration,
        definition: &Arc<EventDefinition>,
        event: &HookEvent,
    ) -> Invocation {
        let started = Instant::now();
        if registration.listener.is_retired() {
            return Invocation {
                outcome: Err(ListenerFault::Retired),
                elapsed: started.elapsed(),
            };
        }

        let view = event.view(definition);
        let ctx = InvocationContext {
            extension_id: registration.extension_id.clone(),
            event: registration.event.clone(),
            registration_id: registration.id,
            timeout: self.timeout,
            deadline: started + self.timeout,
        };
        let listener = registration.listener.clone();

        let task = tokio::task::spawn_blocking(move || {
            let mut view = view;
            listener.invoke(&mut view, &ctx).map(|()| view)
        });

        let outcome = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) if join_err.is_panic() => {
                Err(ListenerFault::Panicked(panic_message(join_err.into_panic())))
            }
            Ok(Err(join_err)) => Err(ListenerFault::Failed(join_err.to_string())),
            Err(_) => Err(ListenerFault::timed_out(self.timeout)),
        };

        let elapsed = started.elapsed();
        trace!(
            registration_id = %registration.id,
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            ok = outcome.is_ok(),
            "Listener invocation finished"
        );
        Invocation { outcome, elapsed }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
