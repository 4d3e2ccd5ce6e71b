//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use kura_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (file merged with environment)
    Show,
    /// Validate the configuration file
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let config = super::load_config(config_path)?;
            match format {
                OutputFormat::Table => {
                    output::print_kv("Listener timeout", &format!("{} ms", config.hooks.listener_timeout_ms));
                    output::print_kv(
                        "Warn on silent",
                        &config.hooks.warn_on_silent_listener.to_string(),
                    );
                    output::print_kv("Fault history", &config.hooks.fault_history.to_string());
                    output::print_kv("Extension dir", &config.extensions.directory);
                    output::print_kv("Auto load", &config.extensions.auto_load.to_string());
                    output::print_kv(
                        "Max operations",
                        &config.extensions.sandbox.max_operations.to_string(),
                    );
                    output::print_kv(
                        "Max call levels",
                        &config.extensions.sandbox.max_call_levels.to_string(),
                    );
                    output::print_kv(
                        "Logging",
                        &format!("{} ({})", config.logging.level, config.logging.format),
                    );
                }
                OutputFormat::Json => output::print_json(&config),
            }
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("Extensions", &config.extensions.directory);
                output::print_kv(
                    "Listener timeout",
                    &format!("{} ms", config.hooks.listener_timeout_ms),
                );
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
    }

    Ok(())
}
