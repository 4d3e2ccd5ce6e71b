//! Extension loading and sandbox configuration.

use serde::{Deserialize, Serialize};

/// Extension discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Directory scanned for extension manifests (`*.json`).
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Whether to load every extension in `directory` on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Resource limits applied to every script sandbox.
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            auto_load: default_true(),
            sandbox: SandboxConfig::default(),
        }
    }
}

/// Interpreter limits for a single extension sandbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Maximum interpreter operations per script run.
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,
    /// Maximum function call nesting.
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,
    /// Maximum length of a string value, in bytes.
    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,
    /// Maximum number of array elements.
    #[serde(default = "default_max_collection_size")]
    pub max_array_size: usize,
    /// Maximum number of object map entries.
    #[serde(default = "default_max_collection_size")]
    pub max_map_size: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_string_size: default_max_string_size(),
            max_array_size: default_max_collection_size(),
            max_map_size: default_max_collection_size(),
        }
    }
}

fn default_directory() -> String {
    "./extensions".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_operations() -> u64 {
    5_000_000
}

fn default_max_call_levels() -> usize {
    64
}

fn default_max_string_size() -> usize {
    1024 * 1024
}

fn default_max_collection_size() -> usize {
    100_000
}
