//! Event catalog listing.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use kura_core::error::AppError;
use kura_hooks::hooks::definitions::EventDefinition;

use crate::output::{self, OutputFormat};

/// Arguments for the events command
#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Only show events whose name contains this text
    #[arg(short = 'm', long)]
    pub filter: Option<String>,

    /// Show hidden fields as well
    #[arg(long)]
    pub all_fields: bool,
}

/// Event display row for table output
#[derive(Debug, Serialize, Tabled)]
struct EventRow {
    #[tabled(rename = "Event")]
    name: String,
    #[tabled(rename = "Prevent default")]
    prevent_default: bool,
    #[tabled(rename = "Fields")]
    fields: String,
}

impl EventRow {
    fn from_definition(definition: &EventDefinition, all_fields: bool) -> Self {
        let fields = definition
            .fields
            .iter()
            .filter(|spec| all_fields || spec.access.is_visible())
            .map(|spec| format!("{}: {} ({})", spec.name, spec.kind, spec.access.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            name: definition.name.clone(),
            prevent_default: definition.prevent_default,
            fields,
        }
    }
}

/// Execute the events command
pub async fn execute(
    args: &EventsArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let manager = super::build_manager(&config)?;

    let definitions: Vec<_> = manager
        .catalog()
        .definitions()
        .into_iter()
        .filter(|def| {
            args.filter
                .as_deref()
                .is_none_or(|needle| def.name.contains(needle))
        })
        .collect();

    match format {
        OutputFormat::Table => {
            let rows: Vec<EventRow> = definitions
                .iter()
                .map(|def| EventRow::from_definition(def, args.all_fields))
                .collect();
            output::print_table(&rows);
        }
        OutputFormat::Json => {
            let defs: Vec<&EventDefinition> = definitions.iter().map(|def| def.as_ref()).collect();
            output::print_json(&defs);
        }
    }

    Ok(())
}
