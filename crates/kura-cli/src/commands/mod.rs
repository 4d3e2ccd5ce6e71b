//! CLI command definitions and dispatch.

pub mod check;
pub mod config;
pub mod events;
pub mod fire;

use clap::{Parser, Subcommand};

use kura_core::config::AppConfig;
use kura_core::error::AppError;
use kura_hooks::ExtensionManager;

use crate::output::OutputFormat;

/// Kura: inspect the hook catalog and exercise extensions from the shell
#[derive(Debug, Parser)]
#[command(name = "kura", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/kura.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the hook events extensions can listen to
    Events(events::EventsArgs),
    /// Load one extension and list the hooks it registers
    Check(check::CheckArgs),
    /// Dispatch an event through loaded extensions
    Fire(fire::FireArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Events(args) => events::execute(args, &self.config, self.format).await,
            Commands::Check(args) => check::execute(args, &self.config, self.format).await,
            Commands::Fire(args) => fire::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: a manager over the built-in event catalog
pub fn build_manager(config: &AppConfig) -> Result<ExtensionManager, AppError> {
    Ok(ExtensionManager::with_builtin_events(&config.hooks)?)
}
