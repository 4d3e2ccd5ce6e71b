//! Sandboxed Rhai engine construction.
//!
//! Each extension gets its own engine with resource limits from
//! [`SandboxConfig`], `eval` disabled, output routed into `tracing`, and
//! the listener registration functions bound to a per-load collector.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr};
use tracing::{debug, info};

use kura_core::config::extensions::SandboxConfig;
use kura_hooks::EventCatalog;

use crate::event_object::ScriptEvent;

/// Operations between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

thread_local! {
    static DEADLINE: Cell<Option<Instant>> = const { Cell::new(None) };
}

/// Runs `f` with the current thread's script deadline set to `deadline`.
pub(crate) fn with_deadline<T>(deadline: Instant, f: impl FnOnce() -> T) -> T {
    struct Reset;
    impl Drop for Reset {
        fn drop(&mut self) {
            DEADLINE.with(|d| d.set(None));
        }
    }

    DEADLINE.with(|d| d.set(Some(deadline)));
    let _reset = Reset;
    f()
}

fn deadline_passed() -> bool {
    DEADLINE.with(|d| d.get().is_some_and(|deadline| Instant::now() >= deadline))
}

/// A listener a script asked for while loading.
#[derive(Debug, Clone)]
pub struct PendingBinding {
    pub event: String,
    pub tags: Vec<String>,
    pub callback: FnPtr,
}

/// Collects registrations during load; `None` once loading has finished.
pub(crate) type Collector = Arc<Mutex<Option<Vec<PendingBinding>>>>;

/// Builds the engine for one extension.
pub(crate) fn build_engine(
    extension_id: &str,
    sandbox: &SandboxConfig,
    catalog: &Arc<EventCatalog>,
    collector: &Collector,
) -> Engine {
    let mut engine = Engine::new();

    engine
        .set_max_operations(sandbox.max_operations)
        .set_max_call_levels(sandbox.max_call_levels)
        .set_max_string_size(sandbox.max_string_size)
        .set_max_array_size(sandbox.max_array_size)
        .set_max_map_size(sandbox.max_map_size);
    engine.disable_symbol("eval");

    engine.on_progress(|ops| {
        if ops % DEADLINE_CHECK_INTERVAL == 0 && deadline_passed() {
            Some(Dynamic::from("deadline exceeded"))
        } else {
            None
        }
    });

    let id = extension_id.to_string();
    engine.on_print(move |text| {
        info!(extension_id = %id, "{text}");
    });
    let id = extension_id.to_string();
    engine.on_debug(move |text, source, pos| {
        debug!(extension_id = %id, source = ?source, position = %pos, "{text}");
    });

    register_event_type(&mut engine);
    register_binding_functions(&mut engine, catalog, collector);

    engine
}

fn register_event_type(engine: &mut Engine) {
    engine
        .register_type_with_name::<ScriptEvent>("HookEvent")
        .register_indexer_get(ScriptEvent::get_field)
        .register_indexer_set(ScriptEvent::set_field)
        .register_fn("next", ScriptEvent::next)
        .register_fn("preventDefault", ScriptEvent::prevent_default)
        .register_fn("prevent_default", ScriptEvent::prevent_default)
        .register_fn("isDefaultPrevented", ScriptEvent::is_default_prevented)
        .register_fn("event_name", ScriptEvent::event_name)
        .register_fn("to_string", ScriptEvent::describe)
        .register_fn("to_debug", ScriptEvent::describe);
}

fn register_binding_functions(engine: &mut Engine, catalog: &Arc<EventCatalog>, collector: &Collector) {
    let (cat, col) = (catalog.clone(), collector.clone());
    engine.register_fn(
        "on",
        move |event: &str, callback: FnPtr| -> Result<(), Box<EvalAltResult>> {
            push_binding(&cat, &col, event, Vec::new(), callback)
        },
    );

    let (cat, col) = (catalog.clone(), collector.clone());
    engine.register_fn(
        "on_tagged",
        move |event: &str, tags: Array, callback: FnPtr| -> Result<(), Box<EvalAltResult>> {
            let tags = tags
                .into_iter()
                .map(|tag| {
                    tag.into_string()
                        .map_err(|ty| format!("tags must be strings, got {ty}"))
                })
                .collect::<Result<Vec<String>, String>>()?;
            push_binding(&cat, &col, event, tags, callback)
        },
    );

    // onScanStarted(|e| ...) style shorthands, one per known event.
    for name in catalog.names() {
        let short = name.strip_suffix("Event").unwrap_or(&name);
        let function = format!("on{short}");
        let (cat, col) = (catalog.clone(), collector.clone());
        engine.register_fn(
            function,
            move |callback: FnPtr| -> Result<(), Box<EvalAltResult>> {
                push_binding(&cat, &col, &name, Vec::new(), callback)
            },
        );
    }
}

fn push_binding(
    catalog: &EventCatalog,
    collector: &Collector,
    event: &str,
    tags: Vec<String>,
    callback: FnPtr,
) -> Result<(), Box<EvalAltResult>> {
    if !catalog.contains(event) {
        return Err(format!("Unknown event: {event}").into());
    }
    let mut pending = collector.lock();
    let Some(bindings) = pending.as_mut() else {
        return Err("hooks can only be registered while the extension is loading".into());
    };
    bindings.push(PendingBinding {
        event: event.to_string(),
        tags,
        callback,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn engine_with_collector() -> (Engine, Collector) {
        let catalog = Arc::new(EventCatalog::with_builtin_events().unwrap());
        let collector: Collector = Arc::new(Mutex::new(Some(Vec::new())));
        let engine = build_engine("test", &SandboxConfig::default(), &catalog, &collector);
        (engine, collector)
    }

    #[test]
    fn test_shorthand_and_tagged_registration() {
        let (engine, collector) = engine_with_collector();
        engine
            .run(
                r#"
                    onScanStarted(|e| e.next());
                    on_tagged("ScanCompletedEvent", ["anime", "manga"], |e| e.next());
                "#,
            )
            .unwrap();

        let bindings = collector.lock().take().unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].event, "ScanStartedEvent");
        assert!(bindings[0].tags.is_empty());
        assert_eq!(bindings[1].tags, vec!["anime", "manga"]);
    }

    #[test]
    fn test_eval_is_disabled() {
        let (engine, _) = engine_with_collector();
        assert!(engine.compile(r#"eval("1 + 1")"#).is_err());
    }

    #[test]
    fn test_expired_deadline_terminates_script() {
        let (engine, _) = engine_with_collector();
        let deadline = Instant::now() - Duration::from_millis(1);
        let err = with_deadline(deadline, || engine.run("loop { }")).unwrap_err();
        assert!(matches!(*err, EvalAltResult::ErrorTerminated(..)));
        assert!(!deadline_passed());
    }

    #[test]
    fn test_non_string_tags_are_rejected() {
        let (engine, collector) = engine_with_collector();
        assert!(engine.run(r#"on_tagged("ScanStartedEvent", [1], |e| e.next());"#).is_err());
        assert!(collector.lock().as_ref().unwrap().is_empty());
    }
}
