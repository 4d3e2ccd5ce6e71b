//! Application configuration schemas.
//!
//! Configuration is deserialized from an optional TOML file merged with
//! `KURA__`-prefixed environment variables via the `config` crate. Each
//! sub-module represents a logical configuration section.

pub mod extensions;
pub mod hooks;
pub mod logging;

use serde::{Deserialize, Serialize};

use self::extensions::ExtensionConfig;
use self::hooks::HookConfig;
use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hook dispatch settings.
    #[serde(default)]
    pub hooks: HookConfig,
    /// Extension loading and sandbox settings.
    #[serde(default)]
    pub extensions: ExtensionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; a missing file yields the defaults overlaid
    /// with environment variables such as `KURA__HOOKS__LISTENER_TIMEOUT_MS`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("KURA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the hook engine unusable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.hooks.listener_timeout_ms == 0 {
            return Err(AppError::configuration(
                "hooks.listener_timeout_ms must be greater than zero",
            ));
        }
        if self.extensions.sandbox.max_operations == 0 {
            return Err(AppError::configuration(
                "extensions.sandbox.max_operations must be greater than zero",
            ));
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(AppError::configuration(format!(
                "logging.format must be 'json' or 'pretty', got '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AppConfig::load("/nonexistent/kura-config").expect("defaults");
        assert_eq!(config.hooks.listener_timeout_ms, 5000);
        assert_eq!(config.extensions.directory, "./extensions");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "[hooks]\nlistener_timeout_ms = 250\n\n[extensions.sandbox]\nmax_operations = 1000\n"
        )
        .expect("write");

        let path = file.path().to_string_lossy().to_string();
        let config = AppConfig::load(&path).expect("load");
        assert_eq!(config.hooks.listener_timeout_ms, 250);
        assert_eq!(config.extensions.sandbox.max_operations, 1000);
        assert_eq!(config.extensions.sandbox.max_call_levels, 64);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.hooks.listener_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
