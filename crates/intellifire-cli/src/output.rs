//! Rendering of coordinator state for the terminal.
//!
//! Both formats are driven by the descriptor tables in
//! `intellifire_core::entity`, so the CLI shows exactly what the
//! coordinator exposes.

use owo_colors::OwoColorize;
use serde_json::json;

use intellifire_core::Coordinator;
use intellifire_core::entity::{self, EntityValue};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Print the full status in the requested format.
///
/// Diagnostic entities are hidden in text mode unless `verbose` is set;
/// JSON always carries everything.
pub fn print_status(
    coordinator: &Coordinator,
    format: OutputFormat,
    verbose: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let doc = status_json(coordinator);
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Text => print_status_text(coordinator, verbose),
    }
    Ok(())
}

/// Status as one JSON document, keyed by entity keys.
pub fn status_json(coordinator: &Coordinator) -> serde_json::Value {
    let info = coordinator.device_info();

    let mut sensors = serde_json::Map::new();
    for d in entity::SENSORS {
        sensors.insert(d.key.to_owned(), value_json(&(d.value)(coordinator)));
    }

    let mut binary = serde_json::Map::new();
    for d in entity::BINARY_SENSORS {
        binary.insert(d.key.to_owned(), json!((d.value)(coordinator)));
    }

    let mut switches = serde_json::Map::new();
    for d in entity::SWITCHES {
        switches.insert(d.key.to_owned(), json!((d.value)(coordinator)));
    }

    json!({
        "device": {
            "manufacturer": info.manufacturer,
            "model": info.model,
            "name": info.name,
            "serial": info.serial,
            "sw_version": info.sw_version,
            "configuration_url": info.configuration_url,
        },
        "modes": {
            "read": coordinator.read_mode().as_str(),
            "control": coordinator.control_mode().as_str(),
        },
        "sensors": sensors,
        "binary_sensors": binary,
        "switches": switches,
    })
}

fn print_status_text(coordinator: &Coordinator, verbose: bool) {
    let info = coordinator.device_info();
    println!(
        "{} ({})  fw {}",
        info.name.bold(),
        info.serial,
        info.sw_version
    );
    println!(
        "  {:<22}{} reads / {} control",
        "transport".dimmed(),
        coordinator.read_mode(),
        coordinator.control_mode()
    );

    for d in entity::BINARY_SENSORS {
        if d.diagnostic && !verbose {
            continue;
        }
        let on = (d.value)(coordinator);
        let state = if on {
            format!("{}", "on".green())
        } else {
            format!("{}", "off".red())
        };
        println!("  {:<22}{state}", d.name.dimmed());
    }

    for d in entity::SENSORS {
        if d.diagnostic && !verbose {
            continue;
        }
        println!(
            "  {:<22}{}",
            d.name.dimmed(),
            render_value(&(d.value)(coordinator))
        );
    }
}

/// One-line summary for `watch`.
pub fn print_watch_line(data: &intellifire_api::PollData) {
    let flame = if data.is_on() {
        format!("{}", "on".green())
    } else {
        format!("{}", "off".red())
    };
    println!(
        "{}  flame {flame}  height {}  fan {}  light {}  {:.1}°C",
        chrono::Local::now().format("%H:%M:%S").dimmed(),
        data.height,
        data.fanspeed,
        data.light,
        data.temperature_c()
    );
}

/// Confirmation line after a command, unless quieted.
pub fn confirm(message: &str, quiet: bool) {
    if !quiet {
        println!("{} {message}", "✓".green());
    }
}

fn render_value(value: &EntityValue) -> String {
    match value {
        EntityValue::Bool(b) => b.to_string(),
        EntityValue::Int(i) => i.to_string(),
        EntityValue::Float(f) => format!("{f:.1}"),
        EntityValue::Text(s) => s.clone(),
        EntityValue::Timestamp(t) => t.to_rfc3339(),
        EntityValue::None => "-".to_owned(),
    }
}

fn value_json(value: &EntityValue) -> serde_json::Value {
    match value {
        EntityValue::Bool(b) => json!(b),
        EntityValue::Int(i) => json!(i),
        EntityValue::Float(f) => json!(f),
        EntityValue::Text(s) => json!(s),
        EntityValue::Timestamp(t) => json!(t.to_rfc3339()),
        EntityValue::None => serde_json::Value::Null,
    }
}
