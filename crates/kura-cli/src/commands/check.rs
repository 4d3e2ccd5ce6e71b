//! Validate a single extension by loading it into a throwaway manager.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use kura_core::error::AppError;
use kura_hooks::ExtensionInfo;
use kura_script::ScriptExtension;

use crate::output::{self, OutputFormat};

/// Arguments for the check command
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to the extension manifest (`*.json`)
    pub manifest: PathBuf,
}

/// Hook display row for table output
#[derive(Debug, Serialize, Tabled)]
struct HookRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    extension: ExtensionInfo,
    hooks: Vec<HookRow>,
}

/// Execute the check command
pub async fn execute(
    args: &CheckArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let manager = super::build_manager(&config)?;

    let extension = ScriptExtension::from_manifest_file(&args.manifest, &config)?;
    let info = extension.manifest().info();
    let handles = manager.load(Arc::new(extension)).await?;

    let mut hooks = Vec::with_capacity(handles.len());
    for handle in &handles {
        let tags = manager
            .hook_registry()
            .listeners_for(&handle.event)
            .await
            .and_then(|chain| chain.iter().find(|r| r.id == handle.id).map(|r| r.tags.clone()))
            .unwrap_or_default();
        hooks.push(HookRow {
            id: handle.id.0,
            event: handle.event.clone(),
            tags: tags.join(", "),
        });
    }

    manager.unload_all().await?;

    match format {
        OutputFormat::Table => {
            output::print_success(&format!(
                "Extension '{}' {} ({}) loaded",
                info.id, info.version, info.language
            ));
            output::print_kv("Name", &info.name);
            if !info.author.is_empty() {
                output::print_kv("Author", &info.author);
            }
            output::print_kv("Hooks", &hooks.len().to_string());
            if hooks.is_empty() {
                output::print_warning("The extension registers no hooks");
            } else {
                output::print_table(&hooks);
            }
        }
        OutputFormat::Json => output::print_json(&CheckReport {
            extension: info,
            hooks,
        }),
    }

    Ok(())
}
