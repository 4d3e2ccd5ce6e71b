//! A compiled, loaded script: its engine, its AST and the listeners it
//! registered while loading.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rhai::{AST, CallFnOptions, Dynamic, Engine, EvalAltResult, FnPtr, Scope};
use tracing::debug;

use kura_core::config::extensions::SandboxConfig;
use kura_hooks::EventCatalog;

use crate::engine::{Collector, PendingBinding, build_engine, with_deadline};
use crate::error::ScriptError;
use crate::event_object::ScriptEvent;

/// The engine and AST shared by every listener of one extension.
pub struct ScriptRuntime {
    extension_id: String,
    engine: Engine,
    ast: AST,
}

/// Output of [`ScriptRuntime::load`].
#[derive(Debug)]
pub struct LoadedScript {
    pub runtime: Arc<ScriptRuntime>,
    pub bindings: Vec<PendingBinding>,
}

impl ScriptRuntime {
    /// Compiles `source`, runs its top-level statements, then `init()` if
    /// the script defines one.
    ///
    /// Blocking; call from a worker thread.
    pub fn load(
        extension_id: &str,
        source: &str,
        sandbox: &SandboxConfig,
        catalog: Arc<EventCatalog>,
        deadline: Instant,
    ) -> Result<LoadedScript, ScriptError> {
        let collector: Collector = Arc::new(Mutex::new(Some(Vec::new())));
        let engine = build_engine(extension_id, sandbox, &catalog, &collector);

        let ast = engine.compile(source).map_err(|e| ScriptError::Compile {
            id: extension_id.to_string(),
            message: e.to_string(),
        })?;

        with_deadline(deadline, || run_load(&engine, &ast)).map_err(|e| ScriptError::Load {
            id: extension_id.to_string(),
            message: e.to_string(),
        })?;

        let bindings = collector.lock().take().unwrap_or_default();
        debug!(
            extension_id = %extension_id,
            bindings = bindings.len(),
            "Script loaded"
        );

        Ok(LoadedScript {
            runtime: Arc::new(Self {
                extension_id: extension_id.to_string(),
                engine,
                ast,
            }),
            bindings,
        })
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// Calls a registered callback with `event`, stopping at `deadline`.
    pub fn call(
        &self,
        callback: &FnPtr,
        event: ScriptEvent,
        deadline: Instant,
    ) -> Result<Dynamic, Box<EvalAltResult>> {
        with_deadline(deadline, || {
            callback.call::<Dynamic>(&self.engine, &self.ast, (event,))
        })
    }
}

fn run_load(engine: &Engine, ast: &AST) -> Result<(), Box<EvalAltResult>> {
    let mut scope = Scope::new();
    engine.run_ast_with_scope(&mut scope, ast)?;

    let has_init = ast
        .iter_functions()
        .any(|f| f.name == "init" && f.params.is_empty());
    if has_init {
        let options = CallFnOptions::new().eval_ast(false);
        engine.call_fn_with_options::<Dynamic>(options, &mut scope, ast, "init", ())?;
    }
    Ok(())
}

impl std::fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("extension_id", &self.extension_id)
            .finish_non_exhaustive()
    }
}
