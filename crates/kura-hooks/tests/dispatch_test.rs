use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::json;

use kura_core::ErrorKind;
use kura_core::config::hooks::HookConfig;
use kura_hooks::events::{
    PreUpdateEntryProgressEvent, ScanStartedEvent, StreamPlaybackRequestedEvent,
};
use kura_hooks::runtime::RuntimeBoundary;
use kura_hooks::{
    ClosureListener, ExtensionManager, FaultReporter, HookDispatcher, HookError, HookEvent,
    HookEventType, ListenerFault, MarshalError, NativeExtension, Outcome,
};

const PROGRESS: &str = "PreUpdateEntryProgressEvent";

fn config() -> HookConfig {
    HookConfig {
        listener_timeout_ms: 200,
        ..HookConfig::default()
    }
}

fn manager() -> ExtensionManager {
    ExtensionManager::with_builtin_events(&config()).unwrap()
}

fn progress_event() -> HookEvent {
    HookEvent::new(PROGRESS)
        .with_field("mediaId", 5)
        .with_field("progress", 3)
        .with_field("totalCount", 12)
}

type Log = Arc<Mutex<Vec<&'static str>>>;

/// An extension that appends `label` to `log` and calls `next()`.
fn logging_extension(id: &'static str, log: &Log) -> Arc<NativeExtension> {
    let log = log.clone();
    Arc::new(NativeExtension::new(id, move |binder| {
        let log = log.clone();
        binder.bind_fn(PROGRESS, move |event| {
            log.lock().push(id);
            event.next();
            Ok(())
        })
    }))
}

#[derive(Default)]
struct RecordingReporter {
    faults: Mutex<Vec<(String, ListenerFault)>>,
}

impl FaultReporter for RecordingReporter {
    fn report(&self, extension_id: &str, _event: &str, fault: &ListenerFault) {
        self.faults.lock().push((extension_id.to_string(), fault.clone()));
    }
}

kura_hooks::hook_event! {
    struct TallyEvent => "TallyEvent", prevent_default = true {
        counts: Vec<i64> => ("counts", Array, ReadWrite),
        label: String => ("label", String, ReadWrite),
    }
}

#[tokio::test]
async fn test_dispatch_without_listeners_returns_payload_untouched() {
    let manager = manager();
    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert!(result.dispatch_id.is_none());
    assert!(result.invocations.is_empty());
    assert!(!result.is_default_prevented());
    assert_eq!(result.event, progress_event());
}

#[tokio::test]
async fn test_dispatch_unknown_event_fails() {
    let manager = manager();
    let err = manager
        .dispatcher()
        .dispatch(HookEvent::new("NotARealEvent"))
        .await
        .unwrap_err();
    assert!(matches!(err, HookError::UnknownEvent(name) if name == "NotARealEvent"));
}

#[tokio::test]
async fn test_listeners_run_in_registration_order_and_see_earlier_writes() {
    let manager = manager();
    let log: Log = Arc::default();

    manager.load(logging_extension("first", &log)).await.unwrap();
    manager
        .load(Arc::new(NativeExtension::new("second", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                let progress = event.get_i64("progress").unwrap_or(0);
                event.set("progress", progress * 2)?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager
        .load(Arc::new(NativeExtension::new("third", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                // Sees the value written by "second".
                assert_eq!(event.get_i64("progress"), Some(6));
                event.set("status", "CURRENT")?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager.load(logging_extension("fourth", &log)).await.unwrap();

    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert_eq!(*log.lock(), vec!["first", "fourth"]);
    let order: Vec<&str> = result
        .invocations
        .iter()
        .map(|i| i.extension_id.as_str())
        .collect();
    assert_eq!(order, vec!["first", "second", "third", "fourth"]);
    assert_eq!(result.fault_count(), 0);
    assert_eq!(result.event.get("progress"), Some(&json!(6)));
    assert_eq!(result.event.get("status"), Some(&json!("CURRENT")));
    assert_eq!(result.event.cursor(), 4);
}

#[tokio::test]
async fn test_prevent_default_is_sticky() {
    let manager = manager();
    let log: Log = Arc::default();

    manager
        .load(Arc::new(NativeExtension::new("preventer", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                event.prevent_default()?;
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager
        .load(Arc::new(NativeExtension::new("observer", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                assert!(event.is_default_prevented());
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager.load(logging_extension("after", &log)).await.unwrap();

    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert!(result.is_default_prevented());
    assert_eq!(*log.lock(), vec!["after"]);
    assert_eq!(result.fault_count(), 0);
}

#[tokio::test]
async fn test_progress_update_scenario_through_typed_trigger() {
    let manager = manager();
    manager
        .load(Arc::new(NativeExtension::new("auto-complete", |binder| {
            binder.bind_fn(PreUpdateEntryProgressEvent::NAME, |event| {
                let total = event.get_i64("totalCount").unwrap_or(0);
                event.set("progress", total)?;
                event.prevent_default()?;
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager
        .load(Arc::new(NativeExtension::new("passthrough", |binder| {
            binder.bind_fn(PreUpdateEntryProgressEvent::NAME, |event| {
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();

    let triggered = manager
        .dispatcher()
        .trigger(PreUpdateEntryProgressEvent {
            media_id: Some(5),
            progress: Some(3),
            total_count: Some(12),
            status: None,
        })
        .await
        .unwrap();

    assert!(triggered.default_prevented());
    match triggered.outcome() {
        Outcome::Prevented(event) => {
            assert_eq!(event.progress, Some(12));
            assert_eq!(event.media_id, Some(5));
        }
        Outcome::Proceed(_) => panic!("default should have been prevented"),
    }
}

#[tokio::test]
async fn test_undecodable_write_is_dropped_without_clearing_prevent_default() {
    let manager = manager();
    manager.catalog().define_type::<TallyEvent>().unwrap();
    manager
        .load(Arc::new(NativeExtension::new("writer", |binder| {
            binder.bind_fn(TallyEvent::NAME, |event| {
                // Passes the array kind check but cannot decode as Vec<i64>.
                event.set("counts", json!(["x"]))?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager
        .load(Arc::new(NativeExtension::new("preventer", |binder| {
            binder.bind_fn(TallyEvent::NAME, |event| {
                event.set("label", "kept")?;
                event.prevent_default()?;
                Ok(())
            })
        })))
        .await
        .unwrap();

    let reporter = Arc::new(RecordingReporter::default());
    let dispatcher = HookDispatcher::new(manager.hook_registry().clone(), &config())
        .with_reporter(reporter.clone());
    let triggered = dispatcher
        .trigger(TallyEvent {
            counts: Some(vec![1, 2]),
            label: None,
        })
        .await
        .unwrap();

    assert!(triggered.default_prevented());
    assert_eq!(triggered.fault_count(), 1);
    let event = triggered.into_event();
    assert_eq!(event.counts, Some(vec![1, 2]));
    assert_eq!(event.label.as_deref(), Some("kept"));

    let faults = reporter.faults.lock();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].0, "writer");
    assert!(matches!(
        &faults[0].1,
        ListenerFault::Marshal(MarshalError::Undecodable { event, .. }) if event == "TallyEvent"
    ));
}

#[tokio::test]
async fn test_rejected_array_write_keeps_a_later_prevent_default() {
    let manager = manager();
    manager
        .load(Arc::new(NativeExtension::new("writer", |binder| {
            binder.bind_fn(ScanStartedEvent::NAME, |event| {
                event.set("otherLibraryPaths", json!([1, 2]))?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager
        .load(Arc::new(NativeExtension::new("preventer", |binder| {
            binder.bind_fn(ScanStartedEvent::NAME, |event| {
                event.set("libraryPath", "/from-ext")?;
                event.prevent_default()?;
                Ok(())
            })
        })))
        .await
        .unwrap();

    let reporter = Arc::new(RecordingReporter::default());
    let dispatcher = HookDispatcher::new(manager.hook_registry().clone(), &config())
        .with_reporter(reporter.clone());
    let triggered = dispatcher
        .trigger(ScanStartedEvent {
            library_path: Some("/anime".to_string()),
            ..ScanStartedEvent::default()
        })
        .await
        .unwrap();

    assert_eq!(triggered.fault_count(), 1);
    match triggered.outcome() {
        Outcome::Prevented(event) => {
            assert_eq!(event.library_path.as_deref(), Some("/from-ext"));
            assert_eq!(event.other_library_paths, None);
        }
        Outcome::Proceed(_) => panic!("default should have been prevented"),
    }

    let faults = reporter.faults.lock();
    assert_eq!(faults[0].0, "writer");
    assert!(matches!(
        &faults[0].1,
        ListenerFault::Marshal(MarshalError::TypeMismatch { field, .. }) if field == "otherLibraryPaths"
    ));
}

#[tokio::test]
async fn test_panicking_listener_is_isolated() {
    let manager = manager();
    let log: Log = Arc::default();

    manager.load(logging_extension("before", &log)).await.unwrap();
    manager
        .load(Arc::new(NativeExtension::new("exploder", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                event.set("progress", 99)?;
                event.prevent_default()?;
                panic!("listener exploded");
            })
        })))
        .await
        .unwrap();
    manager.load(logging_extension("after", &log)).await.unwrap();

    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert_eq!(*log.lock(), vec!["before", "after"]);
    assert_eq!(result.fault_count(), 1);
    assert_eq!(result.event.get("progress"), Some(&json!(3)));
    assert!(!result.is_default_prevented());

    let (record, fault) = result.faults().next().unwrap();
    assert_eq!(record.extension_id, "exploder");
    assert!(matches!(fault, ListenerFault::Panicked(msg) if msg.contains("exploded")));

    let faults = manager.extensions().faults("exploder");
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].event, PROGRESS);
}

#[tokio::test]
async fn test_slow_listener_times_out_and_dispatch_continues() {
    let manager = manager();
    let log: Log = Arc::default();

    manager
        .load(Arc::new(NativeExtension::new("sleeper", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                std::thread::sleep(Duration::from_millis(600));
                event.set("progress", 50)?;
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager.load(logging_extension("after", &log)).await.unwrap();

    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert_eq!(*log.lock(), vec!["after"]);
    assert_eq!(result.event.get("progress"), Some(&json!(3)));
    let (_, fault) = result.faults().next().unwrap();
    assert!(matches!(fault, ListenerFault::TimedOut { timeout_ms: 200 }));
}

#[tokio::test]
async fn test_rejected_write_discards_the_listener_changes() {
    let manager = manager();
    manager
        .load(Arc::new(NativeExtension::new("sneaky", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                event.set("progress", 9)?;
                event.set("mediaId", 1)?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();

    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert_eq!(result.event.get("progress"), Some(&json!(3)));
    assert_eq!(result.event.get("mediaId"), Some(&json!(5)));
    let (_, fault) = result.faults().next().unwrap();
    assert!(matches!(
        fault,
        ListenerFault::Marshal(MarshalError::ReadOnlyField { field, .. }) if field == "mediaId"
    ));
}

#[tokio::test]
async fn test_hidden_fields_never_reach_listeners() {
    let manager = manager();
    let seen = Arc::new(Mutex::new(None));
    let seen_in_listener = seen.clone();

    manager
        .load(Arc::new(NativeExtension::new("player", move |binder| {
            let seen = seen_in_listener.clone();
            binder.bind_fn(StreamPlaybackRequestedEvent::NAME, move |event| {
                *seen.lock() = Some(event.fields().clone());
                assert!(event.get("clientId").is_err());
                event.set("windowTitle", "Renamed")?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();

    let event = HookEvent::new(StreamPlaybackRequestedEvent::NAME)
        .with_field("windowTitle", "Episode 1")
        .with_field("clientId", "client-123");
    let result = manager.dispatcher().dispatch(event).await.unwrap();

    let seen = seen.lock().clone().unwrap();
    assert!(!seen.contains_key("clientId"));
    assert_eq!(result.event.get("clientId"), Some(&json!("client-123")));
    assert_eq!(result.event.get("windowTitle"), Some(&json!("Renamed")));
}

#[tokio::test]
async fn test_unloaded_extension_is_not_invoked() {
    let manager = manager();
    let log: Log = Arc::default();

    manager.load(logging_extension("gone", &log)).await.unwrap();
    manager.load(logging_extension("stays", &log)).await.unwrap();
    manager.unload("gone").await.unwrap();

    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert_eq!(*log.lock(), vec!["stays"]);
    assert_eq!(result.invocations.len(), 1);
    assert_eq!(manager.list().len(), 1);

    let err = manager.unload("gone").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unload_removes_listeners_from_every_event() {
    let manager = manager();
    let log: Log = Arc::default();
    let log_in_setup = log.clone();

    manager
        .load(Arc::new(NativeExtension::new("both", move |binder| {
            let progress_log = log_in_setup.clone();
            binder.bind_fn(PROGRESS, move |event| {
                progress_log.lock().push("progress");
                event.next();
                Ok(())
            })?;
            let scan_log = log_in_setup.clone();
            binder.bind_fn(ScanStartedEvent::NAME, move |event| {
                scan_log.lock().push("scan");
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager.load(logging_extension("stays", &log)).await.unwrap();
    manager.unload("both").await.unwrap();

    let registry = manager.hook_registry();
    assert_eq!(registry.listener_count(PROGRESS).await, 1);
    assert_eq!(registry.listener_count(ScanStartedEvent::NAME).await, 0);

    let dispatcher = manager.dispatcher();
    dispatcher.dispatch(progress_event()).await.unwrap();
    let scan = dispatcher
        .dispatch(HookEvent::new(ScanStartedEvent::NAME))
        .await
        .unwrap();

    assert!(scan.invocations.is_empty());
    assert_eq!(*log.lock(), vec!["stays"]);
}

#[tokio::test]
async fn test_emit_runs_listeners_and_swallows_unknown_events() {
    let manager = manager();
    let log: Log = Arc::default();
    manager.load(logging_extension("listener", &log)).await.unwrap();

    let dispatcher = manager.dispatcher();
    dispatcher.emit(progress_event()).await;
    dispatcher.emit(HookEvent::new("NotARealEvent")).await;

    assert_eq!(*log.lock(), vec!["listener"]);
}

#[tokio::test]
async fn test_in_flight_snapshot_skips_retired_listener() {
    let manager = manager();
    let log: Log = Arc::default();
    manager.load(logging_extension("gone", &log)).await.unwrap();

    let chain = manager
        .hook_registry()
        .listeners_for(PROGRESS)
        .await
        .unwrap();
    manager.unload("gone").await.unwrap();

    let definition = manager.catalog().resolve(PROGRESS).unwrap();
    let boundary = RuntimeBoundary::new(Duration::from_millis(100));
    let invocation = boundary
        .invoke(&chain[0], &definition, &progress_event())
        .await;

    assert!(matches!(invocation.outcome, Err(ListenerFault::Retired)));
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_same_listener_registered_twice_runs_twice() {
    let manager = manager();
    let counter = Arc::new(Mutex::new(0u32));
    let counter_in_setup = counter.clone();

    manager
        .load(Arc::new(NativeExtension::new("twice", move |binder| {
            let counter = counter_in_setup.clone();
            let listener = ClosureListener::shared("count", move |event| {
                *counter.lock() += 1;
                event.next();
                Ok(())
            });
            binder.bind(PROGRESS, listener.clone())?;
            binder.bind(PROGRESS, listener)
        })))
        .await
        .unwrap();

    let result = manager.dispatcher().dispatch(progress_event()).await.unwrap();

    assert_eq!(*counter.lock(), 2);
    assert_eq!(result.invocations.len(), 2);
    assert_ne!(
        result.invocations[0].registration_id,
        result.invocations[1].registration_id
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatches_are_isolated() {
    let manager = manager();
    manager
        .load(Arc::new(NativeExtension::new("increment", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                let progress = event.get_i64("progress").unwrap_or(0);
                // Keeps dispatches overlapping on the worker threads.
                std::thread::sleep(Duration::from_millis(5));
                event.set("progress", progress + 1)?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();
    manager
        .load(Arc::new(NativeExtension::new("double", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                let progress = event.get_i64("progress").unwrap_or(0);
                event.set("progress", progress * 2)?;
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();

    let tasks: Vec<_> = (0..16i64)
        .map(|n| {
            let dispatcher = manager.dispatcher().clone();
            tokio::spawn(async move {
                let event = HookEvent::new(PROGRESS).with_field("progress", n * 10);
                (n, dispatcher.dispatch(event).await)
            })
        })
        .collect();

    for task in tasks {
        let (n, result) = task.await.unwrap();
        let result = result.unwrap();
        assert_eq!(result.event.get("progress"), Some(&json!((n * 10 + 1) * 2)));
        assert_eq!(result.invocations.len(), 2);
        assert_eq!(result.fault_count(), 0);
    }
}

#[tokio::test]
async fn test_tagged_listeners_only_run_for_matching_dispatches() {
    let manager = manager();
    let log: Log = Arc::default();
    let log_in_setup = log.clone();

    manager
        .load(Arc::new(NativeExtension::new("tagged", move |binder| {
            let tagged_log = log_in_setup.clone();
            binder.bind_tagged(
                "ScanStartedEvent",
                vec!["anime".to_string()],
                ClosureListener::shared("anime-only", move |event| {
                    tagged_log.lock().push("anime-only");
                    event.next();
                    Ok(())
                }),
            )?;
            let untagged_log = log_in_setup.clone();
            binder.bind_fn("ScanStartedEvent", move |event| {
                untagged_log.lock().push("always");
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap();

    let dispatcher = manager.dispatcher();
    dispatcher
        .dispatch(HookEvent::new("ScanStartedEvent").with_tags(["manga"]))
        .await
        .unwrap();
    assert_eq!(*log.lock(), vec!["always"]);

    log.lock().clear();
    dispatcher
        .dispatch(HookEvent::new("ScanStartedEvent").with_tags(["anime"]))
        .await
        .unwrap();
    assert_eq!(*log.lock(), vec!["anime-only", "always"]);
}

#[tokio::test]
async fn test_unbind_removes_a_single_registration() {
    let manager = manager();
    let log: Log = Arc::default();
    let handles = manager.load(logging_extension("solo", &log)).await.unwrap();
    assert_eq!(handles.len(), 1);

    let removed = manager.hook_registry().unbind(&handles[0]).await;
    assert!(removed.is_some());
    assert!(manager.hook_registry().unbind(&handles[0]).await.is_none());

    manager.dispatcher().dispatch(progress_event()).await.unwrap();
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_reload_moves_listeners_to_the_end() {
    let manager = manager();
    let log: Log = Arc::default();

    manager.load(logging_extension("a", &log)).await.unwrap();
    manager.load(logging_extension("b", &log)).await.unwrap();
    manager.reload("a").await.unwrap();

    manager.dispatcher().dispatch(progress_event()).await.unwrap();
    assert_eq!(*log.lock(), vec!["b", "a"]);
}

#[tokio::test]
async fn test_replace_swaps_listeners_under_the_same_id() {
    let manager = manager();
    let log: Log = Arc::default();

    let versioned = |label: &'static str| {
        let log = log.clone();
        Arc::new(NativeExtension::new("swap", move |binder| {
            let log = log.clone();
            binder.bind_fn(PROGRESS, move |event| {
                log.lock().push(label);
                event.next();
                Ok(())
            })
        }))
    };

    manager.replace(versioned("v1")).await.unwrap();
    manager.replace(versioned("v2")).await.unwrap();

    manager.dispatcher().dispatch(progress_event()).await.unwrap();
    assert_eq!(*log.lock(), vec!["v2"]);
    assert_eq!(manager.list().len(), 1);
    assert_eq!(manager.hook_registry().listener_count(PROGRESS).await, 1);
}

#[tokio::test]
async fn test_failed_load_registers_nothing() {
    let manager = manager();
    let err = manager
        .load(Arc::new(NativeExtension::new("broken", |binder| {
            binder.bind_fn(PROGRESS, |event| {
                event.next();
                Ok(())
            })?;
            binder.bind_fn("NotARealEvent", |event| {
                event.next();
                Ok(())
            })
        })))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Extension);
    assert_eq!(manager.hook_registry().listener_count(PROGRESS).await, 0);
    assert!(manager.list().is_empty());
}

#[tokio::test]
async fn test_duplicate_extension_id_is_rejected() {
    let manager = manager();
    let log: Log = Arc::default();
    manager.load(logging_extension("dup", &log)).await.unwrap();

    let err = manager
        .load(logging_extension("dup", &log))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(manager.hook_registry().listener_count(PROGRESS).await, 1);
}
