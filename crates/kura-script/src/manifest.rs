//! Extension manifests.
//!
//! A manifest is a JSON file describing one extension and where its script
//! lives:
//!
//! ```json
//! {
//!   "id": "auto-complete",
//!   "name": "Auto complete",
//!   "version": "1.0.0",
//!   "language": "rhai",
//!   "payloadUri": "auto-complete.rhai"
//! }
//! ```

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use kura_hooks::ExtensionInfo;

use crate::error::ScriptError;

/// The only script language this runtime executes.
pub const RHAI: &str = "rhai";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    /// Inline script source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Script file, relative to the manifest's directory.
    #[serde(default, alias = "payloadURI", skip_serializing_if = "Option::is_none")]
    pub payload_uri: Option<String>,
}

fn default_language() -> String {
    RHAI.to_string()
}

/// Extension ids start with a letter and contain only ASCII letters,
/// digits, `-` and `_`.
pub fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        _ => false,
    }
}

impl ExtensionManifest {
    /// Parses and validates a manifest. `origin` is used in error messages.
    pub fn from_json(json: &str, origin: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let manifest: Self = serde_json::from_str(json)
            .map_err(|e| ScriptError::manifest(origin.as_ref(), e.to_string()))?;
        manifest.validate(origin.as_ref())?;
        Ok(manifest)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json, path)
    }

    pub fn validate(&self, origin: &Path) -> Result<(), ScriptError> {
        if !is_valid_id(&self.id) {
            return Err(ScriptError::manifest(
                origin,
                format!(
                    "invalid id '{}': must start with a letter and contain only letters, digits, '-' or '_'",
                    self.id
                ),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ScriptError::manifest(origin, "name must not be empty"));
        }
        if self.version.trim().is_empty() {
            return Err(ScriptError::manifest(origin, "version must not be empty"));
        }
        if !self.language.eq_ignore_ascii_case(RHAI) {
            return Err(ScriptError::UnsupportedLanguage(self.language.clone()));
        }
        match (&self.payload, &self.payload_uri) {
            (Some(_), Some(_)) => Err(ScriptError::manifest(
                origin,
                "payload and payloadUri are mutually exclusive",
            )),
            (None, None) => Err(ScriptError::manifest(
                origin,
                "either payload or payloadUri is required",
            )),
            _ => Ok(()),
        }
    }

    /// Returns the script source, reading `payloadUri` relative to `base_dir`.
    pub fn resolve_source(&self, base_dir: &Path) -> Result<String, ScriptError> {
        if let Some(source) = &self.payload {
            return Ok(source.clone());
        }
        let Some(uri) = &self.payload_uri else {
            return Err(ScriptError::manifest(base_dir, "no script payload"));
        };

        let relative = PathBuf::from(uri);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ScriptError::manifest(
                base_dir,
                format!("payloadUri '{uri}' must be a relative path inside the extension directory"),
            ));
        }

        let path = base_dir.join(relative);
        std::fs::read_to_string(&path).map_err(|source| ScriptError::Io { path, source })
    }

    pub fn info(&self) -> ExtensionInfo {
        ExtensionInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            author: self.author.clone(),
            language: self.language.to_ascii_lowercase(),
        }
    }
}
