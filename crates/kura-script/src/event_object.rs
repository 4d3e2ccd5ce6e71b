//! The event object scripts receive.

use std::sync::Arc;

use parking_lot::Mutex;
use rhai::{Dynamic, EvalAltResult, ImmutableString};

use kura_hooks::{EventView, MarshalError};

/// Script-side handle to an [`EventView`].
///
/// Cloning the handle shares the view, so writes made through any copy are
/// seen when the invocation finishes.
#[derive(Clone)]
pub struct ScriptEvent {
    inner: Arc<Mutex<EventState>>,
}

struct EventState {
    view: EventView,
    /// The first boundary violation, so the listener fault keeps its type.
    marshal_error: Option<MarshalError>,
}

impl ScriptEvent {
    pub fn new(view: EventView) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventState {
                view,
                marshal_error: None,
            })),
        }
    }

    /// The current view and the first marshal error, if any.
    pub fn snapshot(&self) -> (EventView, Option<MarshalError>) {
        let state = self.inner.lock();
        (state.view.clone(), state.marshal_error.clone())
    }

    pub(crate) fn get_field(&mut self, key: ImmutableString) -> Result<Dynamic, Box<EvalAltResult>> {
        let mut state = self.inner.lock();
        let value = match state.view.get(&key) {
            Ok(value) => value,
            Err(err) => return Err(record(&mut state, err)),
        };
        rhai::serde::to_dynamic(&value)
    }

    pub(crate) fn set_field(
        &mut self,
        key: ImmutableString,
        value: Dynamic,
    ) -> Result<(), Box<EvalAltResult>> {
        let mut state = self.inner.lock();
        let json = match rhai::serde::from_dynamic::<serde_json::Value>(&value) {
            Ok(json) => json,
            Err(err) => {
                let err = MarshalError::Unrepresentable {
                    field: key.to_string(),
                    reason: err.to_string(),
                };
                return Err(record(&mut state, err));
            }
        };
        match state.view.set(&key, json) {
            Ok(()) => Ok(()),
            Err(err) => Err(record(&mut state, err)),
        }
    }

    pub(crate) fn next(&mut self) {
        self.inner.lock().view.next();
    }

    pub(crate) fn prevent_default(&mut self) -> Result<(), Box<EvalAltResult>> {
        let mut state = self.inner.lock();
        match state.view.prevent_default() {
            Ok(()) => Ok(()),
            Err(err) => Err(record(&mut state, err)),
        }
    }

    pub(crate) fn is_default_prevented(&mut self) -> bool {
        self.inner.lock().view.is_default_prevented()
    }

    pub(crate) fn event_name(&mut self) -> ImmutableString {
        self.inner.lock().view.name().into()
    }

    pub(crate) fn describe(&mut self) -> String {
        let state = self.inner.lock();
        format!(
            "{}{}",
            state.view.name(),
            serde_json::Value::Object(state.view.fields().clone())
        )
    }
}

fn record(state: &mut EventState, err: MarshalError) -> Box<EvalAltResult> {
    let message = err.to_string();
    state.marshal_error.get_or_insert(err);
    message.into()
}
