//! # kura-hooks
//!
//! Extension hook engine for Kura. Provides:
//!
//! - Event catalog with the built-in host events and their field shapes
//! - Hook listener table with copy-on-write chains and tagged listeners
//! - Dispatch engine with per-listener isolation and `preventDefault()`
//! - Extension lifecycle management (load, unload, reload)
//! - Typed events for host call sites via [`hook_event!`]

pub mod macros;

pub mod error;
pub mod events;
pub mod hooks;
pub mod manager;
pub mod prelude;
pub mod registry;
pub mod runtime;

pub use error::{HookError, HookResult, ListenerFault, MarshalError};
pub use hooks::catalog::EventCatalog;
pub use hooks::dispatcher::{DispatchResult, FaultReporter, HookDispatcher};
pub use hooks::event::{EventView, HookEvent};
pub use hooks::registry::{HookRegistry, RegistrationHandle, RegistrationId};
pub use hooks::typed::{HookEventType, Outcome, Triggered};
pub use manager::{ExtensionManager, HookBinder};
pub use registry::{Extension, ExtensionInfo, ExtensionRegistry};
pub use runtime::{ClosureListener, HookListener, NativeExtension};
