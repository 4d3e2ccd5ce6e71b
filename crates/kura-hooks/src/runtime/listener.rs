//! The listener contract every extension runtime implements.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::ListenerFault;
use crate::hooks::event::EventView;
use crate::hooks::registry::RegistrationId;

/// Per-invocation information handed to a listener.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub extension_id: String,
    pub event: String,
    pub registration_id: RegistrationId,
    /// The wall-clock budget the invocation was given.
    pub timeout: Duration,
    /// After this instant the dispatcher has stopped waiting.
    pub deadline: Instant,
}

impl InvocationContext {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// The fault to report when this invocation runs past its deadline.
    pub fn timed_out(&self) -> ListenerFault {
        ListenerFault::timed_out(self.timeout)
    }
}

/// A callback bound to a hook event.
///
/// `invoke` runs on a blocking worker thread with exclusive access to the
/// event view. Returning an error discards every write the listener made.
///
/// A retired listener is never invoked again, so extensions create fresh
/// listeners each time they are loaded.
pub trait HookListener: Send + Sync + fmt::Debug + 'static {
    fn invoke(&self, event: &mut EventView, ctx: &InvocationContext) -> Result<(), ListenerFault>;

    /// Called when the owning extension is unloaded. Later invocations
    /// should be refused.
    fn retire(&self) {}

    fn is_retired(&self) -> bool {
        false
    }
}

/// A native listener backed by a closure.
pub struct ClosureListener<F> {
    name: String,
    callback: F,
    retired: AtomicBool,
}

impl<F> ClosureListener<F>
where
    F: Fn(&mut EventView) -> Result<(), ListenerFault> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
            retired: AtomicBool::new(false),
        }
    }

    /// Wraps the closure as a shareable listener.
    pub fn shared(name: impl Into<String>, callback: F) -> Arc<dyn HookListener> {
        Arc::new(Self::new(name, callback))
    }
}

impl<F> fmt::Debug for ClosureListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureListener")
            .field("name", &self.name)
            .field("retired", &self.retired.load(Ordering::Relaxed))
            .finish()
    }
}

impl<F> HookListener for ClosureListener<F>
where
    F: Fn(&mut EventView) -> Result<(), ListenerFault> + Send + Sync + 'static,
{
    fn invoke(&self, event: &mut EventView, ctx: &InvocationContext) -> Result<(), ListenerFault> {
        if self.is_retired() {
            return Err(ListenerFault::Retired);
        }
        // Queued behind busy workers until the dispatcher gave up.
        if ctx.is_expired() {
            return Err(ctx.timed_out());
        }
        (self.callback)(event)
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::definitions::EventDefinition;
    use crate::hooks::event::HookEvent;

    fn context(timeout: Duration, started: Instant) -> InvocationContext {
        InvocationContext {
            extension_id: "ext".to_string(),
            event: "ScanStartedEvent".to_string(),
            registration_id: RegistrationId(1),
            timeout,
            deadline: started + timeout,
        }
    }

    #[test]
    fn test_listener_started_after_deadline_times_out() {
        let definition = Arc::new(EventDefinition::builder("ScanStartedEvent").build());
        let mut view = HookEvent::new("ScanStartedEvent").view(&definition);
        let listener = ClosureListener::new("never", |_event: &mut EventView| -> Result<(), ListenerFault> {
            panic!("must not run past its deadline")
        });

        let budget = Duration::from_millis(50);
        let ctx = context(budget, Instant::now() - Duration::from_millis(60));
        assert!(ctx.is_expired());
        assert!(matches!(
            listener.invoke(&mut view, &ctx),
            Err(ListenerFault::TimedOut { timeout_ms: 50 })
        ));
    }

    #[test]
    fn test_listener_within_deadline_runs() {
        let definition = Arc::new(EventDefinition::builder("ScanStartedEvent").build());
        let mut view = HookEvent::new("ScanStartedEvent").view(&definition);
        let listener = ClosureListener::new("runs", |event: &mut EventView| {
            event.next();
            Ok(())
        });

        let ctx = context(Duration::from_secs(5), Instant::now());
        assert!(!ctx.is_expired());
        assert!(listener.invoke(&mut view, &ctx).is_ok());
        assert!(!view.signals().is_silent());
    }
}
