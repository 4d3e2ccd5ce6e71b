//! # kura-core
//!
//! Core crate for Kura. Contains the configuration schemas and the unified
//! error system shared by the hook engine, the script sandbox and the CLI.
//!
//! This crate has **no** internal dependencies on other Kura crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
