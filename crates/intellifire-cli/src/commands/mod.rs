//! Command dispatch: bridges CLI args onto coordinator operations.

pub mod config_cmd;
pub mod control;
pub mod mode;
pub mod status;
pub mod watch;

use intellifire_core::Coordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a fireplace-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &Coordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(coordinator, global),
        Command::Watch(args) => watch::handle(coordinator, args, global).await,
        Command::Flame { state } => control::flame(coordinator, state, global).await,
        Command::Pilot { state } => control::pilot(coordinator, state, global).await,
        Command::Height { level } => control::height(coordinator, level, global).await,
        Command::Fan { speed } => control::fan(coordinator, speed, global).await,
        Command::Light { level } => control::light(coordinator, level, global).await,
        Command::Thermostat { action } => control::thermostat(coordinator, action, global).await,
        Command::Timer { action } => control::timer(coordinator, action, global).await,
        Command::Beep => control::beep(coordinator, global).await,
        Command::Mode { action } => mode::handle(coordinator, action, global).await,
        // Normally routed before a coordinator exists; handling it here too
        // keeps the dispatch total.
        Command::Config { action } => config_cmd::handle(action, global),
    }
}
