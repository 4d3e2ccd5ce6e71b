//! Script runtime errors.

use std::path::PathBuf;

use thiserror::Error;

use kura_core::error::{AppError, ErrorKind};

/// Errors raised while reading manifests or loading scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script for '{id}' failed to compile: {message}")]
    Compile { id: String, message: String },

    #[error("Script for '{id}' failed while loading: {message}")]
    Load { id: String, message: String },

    #[error("Invalid manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("Unsupported extension language '{0}'")]
    UnsupportedLanguage(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScriptError {
    pub(crate) fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<ScriptError> for AppError {
    fn from(err: ScriptError) -> Self {
        let kind = match &err {
            ScriptError::Compile { .. } | ScriptError::Load { .. } => ErrorKind::Script,
            ScriptError::Manifest { .. } | ScriptError::UnsupportedLanguage(_) => {
                ErrorKind::Validation
            }
            ScriptError::Io { .. } => ErrorKind::Io,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
