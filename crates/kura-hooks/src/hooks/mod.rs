//! Hook system: event catalog, listener table and dispatch engine.

pub mod catalog;
pub mod definitions;
pub mod dispatcher;
pub mod event;
pub mod registry;
pub mod typed;
