//! Extension runtime boundary: the listener contract, the isolation
//! wrapper the dispatcher calls through, and native extensions.

pub mod boundary;
pub mod listener;
pub mod native;

pub use boundary::{Invocation, RuntimeBoundary};
pub use listener::{ClosureListener, HookListener, InvocationContext};
pub use native::NativeExtension;
