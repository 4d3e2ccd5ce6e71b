//! Hook dispatcher: runs an event through its listener chain.
//!
//! - Listeners run one at a time, in registration order, against the chain
//!   snapshot taken when the dispatch starts.
//! - Every listener runs. `next()` is advisory and `preventDefault()` only
//!   sets a flag the call site reads afterwards.
//! - A faulting listener is logged, reported and skipped; its writes are
//!   discarded and the dispatch continues.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use kura_core::config::hooks::HookConfig;

use crate::error::{HookError, HookResult, ListenerFault, MarshalError};
use crate::hooks::catalog::EventCatalog;
use crate::hooks::event::{EventView, HookEvent, Signals};
use crate::hooks::registry::{HookRegistry, RegistrationId};
use crate::hooks::typed::{HookEventType, Triggered};
use crate::runtime::boundary::RuntimeBoundary;

/// Extra acceptance test a committed payload must pass, e.g. decoding into
/// the typed event the call site expects.
type PayloadCheck = fn(&Map<String, Value>) -> Result<(), String>;

/// Receives listener faults as they happen.
pub trait FaultReporter: Send + Sync {
    fn report(&self, extension_id: &str, event: &str, fault: &ListenerFault);
}

/// What happened to one listener during a dispatch.
#[derive(Debug, Clone)]
pub struct InvocationRecord {
    pub registration_id: RegistrationId,
    pub extension_id: String,
    pub elapsed: Duration,
    /// `Ok` with the raised signals, or the fault that discarded the call.
    pub result: Result<Signals, ListenerFault>,
}

/// Aggregated result of dispatching an event.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub dispatch_id: Option<Uuid>,
    /// The payload after every listener has run.
    pub event: HookEvent,
    /// One record per listener that was invoked, in invocation order.
    pub invocations: Vec<InvocationRecord>,
}

impl DispatchResult {
    fn untouched(event: HookEvent) -> Self {
        Self {
            dispatch_id: None,
            event,
            invocations: Vec::new(),
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.event.is_default_prevented()
    }

    pub fn fault_count(&self) -> usize {
        self.invocations.iter().filter(|i| i.result.is_err()).count()
    }

    pub fn faults(&self) -> impl Iterator<Item = (&InvocationRecord, &ListenerFault)> {
        self.invocations
            .iter()
            .filter_map(|record| record.result.as_ref().err().map(|fault| (record, fault)))
    }

    pub fn into_event(self) -> HookEvent {
        self.event
    }
}

/// Dispatches events to all registered listeners.
pub struct HookDispatcher {
    catalog: Arc<EventCatalog>,
    registry: Arc<HookRegistry>,
    boundary: RuntimeBoundary,
    reporter: Option<Arc<dyn FaultReporter>>,
    warn_on_silent_listener: bool,
}

impl HookDispatcher {
    pub fn new(registry: Arc<HookRegistry>, config: &HookConfig) -> Self {
        Self {
            catalog: registry.catalog().clone(),
            registry,
            boundary: RuntimeBoundary::from_config(config),
            reporter: None,
            warn_on_silent_listener: config.warn_on_silent_listener,
        }
    }

    /// Routes listener faults to `reporter` in addition to the log.
    pub fn with_reporter(mut self, reporter: Arc<dyn FaultReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn catalog(&self) -> &Arc<EventCatalog> {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// Runs `event` through its listener chain.
    ///
    /// Fails only when the event name is not defined. Listener faults are
    /// recorded in the result, never returned.
    pub async fn dispatch(&self, event: HookEvent) -> HookResult<DispatchResult> {
        self.run(event, None).await
    }

    async fn run(&self, event: HookEvent, check: Option<PayloadCheck>) -> HookResult<DispatchResult> {
        let definition = self.catalog.resolve(event.name())?;

        let Some(chain) = self.registry.listeners_for(event.name()).await else {
            return Ok(DispatchResult::untouched(event));
        };

        let dispatch_id = Uuid::new_v4();
        debug!(
            dispatch_id = %dispatch_id,
            event = %event.name(),
            listener_count = chain.len(),
            tags = ?event.tags(),
            "Dispatching hook event"
        );

        let mut event = event;
        let mut invocations = Vec::with_capacity(chain.len());

        for registration in chain.iter() {
            if !registration.matches_tags(event.tags()) {
                continue;
            }

            let invocation = self.boundary.invoke(registration, &definition, &event).await;
            let outcome = invocation
                .outcome
                .and_then(|view| commit_view(&mut event, view, check));
            let result = match outcome {
                Ok(signals) => {
                    if signals.is_silent() && self.warn_on_silent_listener {
                        warn!(
                            dispatch_id = %dispatch_id,
                            event = %registration.event,
                            extension_id = %registration.extension_id,
                            registration_id = %registration.id,
                            "Listener returned without calling next() or preventDefault()"
                        );
                    }
                    debug!(
                        dispatch_id = %dispatch_id,
                        extension_id = %registration.extension_id,
                        registration_id = %registration.id,
                        prevented = signals.default_prevented,
                        "Listener completed"
                    );
                    Ok(signals)
                }
                Err(fault) => {
                    self.log_fault(dispatch_id, &registration.event, &registration.extension_id, &fault);
                    if let Some(reporter) = &self.reporter {
                        reporter.report(&registration.extension_id, &registration.event, &fault);
                    }
                    Err(fault)
                }
            };

            invocations.push(InvocationRecord {
                registration_id: registration.id,
                extension_id: registration.extension_id.clone(),
                elapsed: invocation.elapsed,
                result,
            });
        }

        debug!(
            dispatch_id = %dispatch_id,
            event = %event.name(),
            invoked = invocations.len(),
            default_prevented = event.is_default_prevented(),
            "Hook event dispatched"
        );

        Ok(DispatchResult {
            dispatch_id: Some(dispatch_id),
            event,
            invocations,
        })
    }

    /// Dispatches a notification-style event and discards the result.
    ///
    /// An undefined event is logged instead of returned.
    pub async fn emit(&self, event: HookEvent) {
        let name = event.name().to_string();
        if let Err(e) = self.dispatch(event).await {
            error!(event = %name, error = %e, "Failed to emit hook event");
        }
    }

    /// Triggers a typed event and decodes the payload listeners left behind.
    pub async fn trigger<E: HookEventType>(&self, event: E) -> HookResult<Triggered<E>> {
        self.trigger_tagged(event, Vec::<String>::new()).await
    }

    /// Like [`trigger`](Self::trigger), restricted to listeners matching `tags`.
    pub async fn trigger_tagged<E, I, S>(&self, event: E, tags: I) -> HookResult<Triggered<E>>
    where
        E: HookEventType,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.catalog.define_type::<E>()?;

        let fields = match serde_json::to_value(&event) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(HookError::Serialization {
                    event: E::NAME.to_string(),
                    reason: format!("expected an object, got {other}"),
                });
            }
            Err(e) => {
                return Err(HookError::Serialization {
                    event: E::NAME.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let result = self
            .run(
                HookEvent::from_fields(E::NAME, fields).with_tags(tags),
                Some(decodes_as::<E>),
            )
            .await?;
        let default_prevented = result.is_default_prevented();
        let faults = result.fault_count();

        // Every committed listener passed `decodes_as`, so this only fails if
        // the host's own payload does not round-trip.
        let decoded = serde_json::from_value::<E>(Value::Object(result.into_event().into_fields()))
            .map_err(|e| HookError::Serialization {
                event: E::NAME.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Triggered::new(decoded, default_prevented, faults))
    }

    fn log_fault(&self, dispatch_id: Uuid, event: &str, extension_id: &str, fault: &ListenerFault) {
        match fault {
            ListenerFault::Retired => debug!(
                dispatch_id = %dispatch_id,
                event = %event,
                extension_id = %extension_id,
                "Skipped listener of unloaded extension"
            ),
            ListenerFault::TimedOut { timeout_ms } => error!(
                dispatch_id = %dispatch_id,
                event = %event,
                extension_id = %extension_id,
                timeout_ms = timeout_ms,
                "Hook listener timed out"
            ),
            ListenerFault::Panicked(message) => error!(
                dispatch_id = %dispatch_id,
                event = %event,
                extension_id = %extension_id,
                panic = %message,
                "Hook listener panicked"
            ),
            other => warn!(
                dispatch_id = %dispatch_id,
                event = %event,
                extension_id = %extension_id,
                error = %other,
                "Hook listener faulted"
            ),
        }
    }
}

/// Applies a listener's view to the payload. With a `check`, the merged
/// payload must pass it or the listener's writes and signals are dropped.
fn commit_view(
    event: &mut HookEvent,
    view: EventView,
    check: Option<PayloadCheck>,
) -> Result<Signals, ListenerFault> {
    let Some(check) = check else {
        return Ok(event.commit(view));
    };

    let mut candidate = event.clone();
    let signals = candidate.commit(view);
    check(candidate.fields()).map_err(|reason| MarshalError::Undecodable {
        event: event.name().to_string(),
        reason,
    })?;
    *event = candidate;
    Ok(signals)
}

fn decodes_as<E: HookEventType>(fields: &Map<String, Value>) -> Result<(), String> {
    serde_json::from_value::<E>(Value::Object(fields.clone()))
        .map(|_| ())
        .map_err(|e| e.to_string())
}

impl std::fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("registry", &self.registry)
            .field("boundary", &self.boundary)
            .field("has_reporter", &self.reporter.is_some())
            .finish()
    }
}
