//! `firectl mode` -- inspect or switch the read/control transports.

use intellifire_core::Coordinator;

use crate::cli::{GlobalOpts, ModeAction, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    coordinator: &Coordinator,
    action: ModeAction,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match action {
        ModeAction::Show => match global.output {
            OutputFormat::Text => {
                println!("read:    {}", coordinator.read_mode());
                println!("control: {}", coordinator.control_mode());
            }
            OutputFormat::Json => {
                let doc = serde_json::json!({
                    "read": coordinator.read_mode().as_str(),
                    "control": coordinator.control_mode().as_str(),
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
        },
        ModeAction::Read { mode } => {
            coordinator.set_read_mode(mode.into()).await;
            output::confirm(
                &format!("read mode set to {}", coordinator.read_mode()),
                global.quiet,
            );
        }
        ModeAction::Control { mode } => {
            coordinator.set_control_mode(mode.into()).await;
            output::confirm(
                &format!("control mode set to {}", coordinator.control_mode()),
                global.quiet,
            );
        }
    }
    Ok(())
}
