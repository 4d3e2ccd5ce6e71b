//! Dispatch an event from the command line.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::Tabled;

use kura_core::error::AppError;
use kura_hooks::{DispatchResult, HookEvent};
use kura_script::{ExtensionLoader, LoadReport};

use crate::output::{self, OutputFormat};

/// Arguments for the fire command
#[derive(Debug, Args)]
pub struct FireArgs {
    /// Event name, e.g. `PreUpdateEntryProgressEvent`
    pub event: String,

    /// Event payload as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub payload: String,

    /// Dispatch tag; repeat for several
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Extension directory (defaults to `extensions.directory`)
    #[arg(short, long)]
    pub extensions: Option<PathBuf>,
}

/// Listener display row for table output
#[derive(Debug, Serialize, Tabled)]
struct InvocationRow {
    #[tabled(rename = "Extension")]
    extension: String,
    #[tabled(rename = "Hook")]
    hook: u64,
    #[tabled(rename = "Elapsed")]
    elapsed: String,
    #[tabled(rename = "Result")]
    result: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FireReport {
    event: String,
    payload: Map<String, Value>,
    default_prevented: bool,
    listeners: Vec<InvocationRow>,
    load: LoadReport,
}

impl FireReport {
    fn new(result: DispatchResult, load: LoadReport) -> Self {
        let listeners = result
            .invocations
            .iter()
            .map(|record| InvocationRow {
                extension: record.extension_id.clone(),
                hook: record.registration_id.0,
                elapsed: format!("{:.1?}", record.elapsed),
                result: match &record.result {
                    Ok(signals) if signals.default_prevented => "prevented default".to_string(),
                    Ok(signals) if signals.next_called => "next".to_string(),
                    Ok(_) => "silent".to_string(),
                    Err(fault) => format!("fault: {fault}"),
                },
            })
            .collect();

        let default_prevented = result.is_default_prevented();
        let event = result.into_event();
        Self {
            event: event.name().to_string(),
            default_prevented,
            payload: event.into_fields(),
            listeners,
            load,
        }
    }
}

fn parse_payload(raw: &str) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(AppError::validation(format!(
            "Payload must be a JSON object, got {}",
            kura_hooks::hooks::definitions::describe_value(&other)
        ))),
        Err(e) => Err(AppError::validation(format!("Payload is not valid JSON: {e}"))),
    }
}

/// Execute the fire command
pub async fn execute(
    args: &FireArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let manager = super::build_manager(&config)?;
    let fields = parse_payload(&args.payload)?;

    let load = match &args.extensions {
        Some(dir) => ExtensionLoader::new(dir, config.clone()).load_all(&manager).await?,
        None if config.extensions.auto_load => {
            ExtensionLoader::from_config(&config).load_all(&manager).await?
        }
        None => LoadReport::default(),
    };

    let event = HookEvent::from_fields(&args.event, fields).with_tags(args.tags.iter().cloned());
    let result = manager.dispatcher().dispatch(event).await?;
    manager.unload_all().await?;

    let report = FireReport::new(result, load);
    match format {
        OutputFormat::Table => print_report(&report),
        OutputFormat::Json => output::print_json(&report),
    }

    Ok(())
}

fn print_report(report: &FireReport) {
    for (path, reason) in &report.load.failed {
        output::print_warning(&format!("{} not loaded: {reason}", path.display()));
    }

    output::print_kv("Event", &report.event);
    output::print_kv("Default prevented", &report.default_prevented.to_string());
    let payload = serde_json::to_string_pretty(&report.payload).unwrap_or_else(|_| "{}".to_string());
    output::print_kv("Payload", &payload);

    if report.listeners.is_empty() {
        output::print_warning("No listeners ran for this event");
    } else {
        output::print_table(&report.listeners);
    }
}
