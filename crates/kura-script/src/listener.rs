//! Script callbacks as hook listeners.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rhai::{EvalAltResult, FnPtr};

use kura_hooks::runtime::InvocationContext;
use kura_hooks::{EventView, HookListener, ListenerFault};

use crate::engine::PendingBinding;
use crate::event_object::ScriptEvent;
use crate::runtime::ScriptRuntime;

/// A Rhai function pointer registered by a script.
pub struct ScriptListener {
    runtime: Arc<ScriptRuntime>,
    event: String,
    callback: FnPtr,
    retired: AtomicBool,
}

impl ScriptListener {
    pub fn new(runtime: Arc<ScriptRuntime>, binding: &PendingBinding) -> Self {
        Self {
            runtime,
            event: binding.event.clone(),
            callback: binding.callback.clone(),
            retired: AtomicBool::new(false),
        }
    }
}

impl HookListener for ScriptListener {
    fn invoke(&self, event: &mut EventView, ctx: &InvocationContext) -> Result<(), ListenerFault> {
        if self.is_retired() {
            return Err(ListenerFault::Retired);
        }
        if ctx.is_expired() {
            return Err(ctx.timed_out());
        }

        let handle = ScriptEvent::new(event.clone());
        let result = self.runtime.call(&self.callback, handle.clone(), ctx.deadline);
        let (view, marshal_error) = handle.snapshot();

        match result {
            Ok(_) => {
                *event = view;
                Ok(())
            }
            Err(err) => Err(match marshal_error {
                Some(marshal) => ListenerFault::Marshal(marshal),
                None => script_fault(*err, ctx),
            }),
        }
    }

    fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }
}

fn script_fault(err: EvalAltResult, ctx: &InvocationContext) -> ListenerFault {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => script_fault(*inner, ctx),
        EvalAltResult::ErrorTerminated(..) => ctx.timed_out(),
        EvalAltResult::ErrorTooManyOperations(..) => {
            ListenerFault::failed("script exceeded its operation budget")
        }
        other => ListenerFault::Failed(other.to_string()),
    }
}

impl std::fmt::Debug for ScriptListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptListener")
            .field("extension_id", &self.runtime.extension_id())
            .field("event", &self.event)
            .field("callback", &self.callback.fn_name())
            .finish()
    }
}
