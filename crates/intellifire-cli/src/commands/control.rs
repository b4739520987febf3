//! Command handlers that write to the fireplace.
//!
//! Every handler routes through whichever transport the control mode
//! points at, then nudges the coordinator so the next snapshot reflects
//! the change.

use intellifire_api::FireplaceController;
use intellifire_core::Coordinator;

use crate::cli::{GlobalOpts, OnOff, ThermostatAction, TimerAction};
use crate::error::CliError;
use crate::output;

pub async fn flame(
    coordinator: &Coordinator,
    state: OnOff,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let api = coordinator.control_api();
    match state {
        OnOff::On => api.flame_on().await?,
        OnOff::Off => api.flame_off().await?,
    }
    coordinator.request_refresh();
    output::confirm(&format!("flame {}", label(state)), global.quiet);
    Ok(())
}

pub async fn pilot(
    coordinator: &Coordinator,
    state: OnOff,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let api = coordinator.control_api();
    match state {
        OnOff::On => api.pilot_on().await?,
        OnOff::Off => api.pilot_off().await?,
    }
    coordinator.request_refresh();
    output::confirm(&format!("pilot light {}", label(state)), global.quiet);
    Ok(())
}

pub async fn height(
    coordinator: &Coordinator,
    level: u8,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // CLI takes 1-5; the wire speaks 0-4.
    coordinator.control_api().set_flame_height(level - 1).await?;
    coordinator.request_refresh();
    output::confirm(&format!("flame height set to {level}"), global.quiet);
    Ok(())
}

pub async fn fan(
    coordinator: &Coordinator,
    speed: u8,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator.control_api().set_fan_speed(speed).await?;
    coordinator.request_refresh();
    let message = if speed == 0 {
        "fan off".to_owned()
    } else {
        format!("fan speed set to {speed}")
    };
    output::confirm(&message, global.quiet);
    Ok(())
}

pub async fn light(
    coordinator: &Coordinator,
    level: u8,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    coordinator.control_api().set_light_level(level).await?;
    coordinator.request_refresh();
    let message = if level == 0 {
        "lights off".to_owned()
    } else {
        format!("light level set to {level}")
    };
    output::confirm(&message, global.quiet);
    Ok(())
}

pub async fn thermostat(
    coordinator: &Coordinator,
    action: ThermostatAction,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let api = coordinator.control_api();
    let message = match action {
        ThermostatAction::Set { celsius } => {
            api.set_thermostat_c(celsius).await?;
            format!("thermostat set to {celsius:.1}°C")
        }
        ThermostatAction::Off => {
            api.turn_off_thermostat().await?;
            "thermostat off".to_owned()
        }
    };
    coordinator.request_refresh();
    output::confirm(&message, global.quiet);
    Ok(())
}

pub async fn timer(
    coordinator: &Coordinator,
    action: TimerAction,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let api = coordinator.control_api();
    let message = match action {
        TimerAction::Set { minutes } => {
            api.set_sleep_timer(minutes * 60).await?;
            format!("sleep timer set to {minutes} min")
        }
        TimerAction::Off => {
            api.stop_sleep_timer().await?;
            "sleep timer cancelled".to_owned()
        }
    };
    coordinator.request_refresh();
    output::confirm(&message, global.quiet);
    Ok(())
}

pub async fn beep(coordinator: &Coordinator, global: &GlobalOpts) -> Result<(), CliError> {
    coordinator.control_api().beep().await?;
    output::confirm("beep", global.quiet);
    Ok(())
}

fn label(state: OnOff) -> &'static str {
    match state {
        OnOff::On => "on",
        OnOff::Off => "off",
    }
}
