//! # kura-script
//!
//! Rhai runtime for Kura extensions. Provides:
//!
//! - A sandboxed engine per extension with operation, size and time limits
//! - The script-side event object (`e.field`, `e.next()`, `e.preventDefault()`)
//! - Listener registration from scripts via `on`, `on_tagged` and `on<Event>`
//! - JSON extension manifests and a directory loader

pub mod engine;
pub mod error;
pub mod event_object;
pub mod extension;
pub mod listener;
pub mod loader;
pub mod manifest;
pub mod runtime;

pub use error::ScriptError;
pub use extension::ScriptExtension;
pub use loader::{ExtensionLoader, LoadReport};
pub use manifest::ExtensionManifest;
