//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use crate::error::{HookError, HookResult, ListenerFault, MarshalError};
pub use crate::hooks::catalog::EventCatalog;
pub use crate::hooks::definitions::{EventDefinition, FieldAccess, FieldKind};
pub use crate::hooks::dispatcher::HookDispatcher;
pub use crate::hooks::event::{EventView, HookEvent};
pub use crate::hooks::typed::{HookEventType, Outcome, Triggered};
pub use crate::manager::{ExtensionManager, HookBinder};
pub use crate::registry::{Extension, ExtensionInfo};
pub use crate::runtime::listener::{ClosureListener, HookListener, InvocationContext};
pub use crate::runtime::native::NativeExtension;

pub use crate::{hook_event, hook_payload};
