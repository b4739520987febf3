// ── Entity descriptors ──
//
// Declarative tables mapping coordinator state onto display/control
// surfaces. Each descriptor pairs a stable key with a value extractor and,
// for controllable entities, async actions that route through whichever
// transport the control mode currently points at. Actions request an
// immediate refresh so state catches up without waiting out the interval.

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::BoxFuture;

use intellifire_api::{ErrorCode, FireplaceController, FireplaceReadSource};

use crate::config::ApiMode;
use crate::coordinator::Coordinator;
use crate::error::CoreError;

/// A value read out of the coordinator for display.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    None,
}

pub type ValueFn = fn(&Coordinator) -> EntityValue;
pub type BoolFn = fn(&Coordinator) -> bool;
pub type ActionFn = for<'a> fn(&'a Coordinator) -> BoxFuture<'a, Result<(), CoreError>>;
pub type SetLevelFn = for<'a> fn(&'a Coordinator, u8) -> BoxFuture<'a, Result<(), CoreError>>;
pub type SetValueFn = for<'a> fn(&'a Coordinator, f64) -> BoxFuture<'a, Result<(), CoreError>>;

/// Read-only value surface.
pub struct SensorDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    /// Display hint ("temperature", "timestamp", ...), where one applies.
    pub device_class: Option<&'static str>,
    /// Diagnostic values are hidden from the primary display by default.
    pub diagnostic: bool,
    pub value: ValueFn,
}

/// Read-only on/off surface.
pub struct BinarySensorDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<&'static str>,
    pub diagnostic: bool,
    pub value: BoolFn,
}

/// Toggleable surface.
pub struct SwitchDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub value: BoolFn,
    pub turn_on: ActionFn,
    pub turn_off: ActionFn,
}

/// Numeric setter surface.
pub struct NumberDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: ValueFn,
    pub set: SetValueFn,
}

/// Blower fan surface.
pub struct FanDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub max_speed: u8,
    pub supported: BoolFn,
    pub speed: ValueFn,
    pub set_speed: SetLevelFn,
    pub turn_off: ActionFn,
}

/// Accent light surface.
pub struct LightDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub max_level: u8,
    pub supported: BoolFn,
    pub level: ValueFn,
    pub set_level: SetLevelFn,
    pub turn_off: ActionFn,
}

/// Thermostat surface.
pub struct ClimateDescriptor {
    pub key: &'static str,
    pub name: &'static str,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub supported: BoolFn,
    pub active: BoolFn,
    pub current_temp: ValueFn,
    pub target_temp: ValueFn,
    pub set_target: SetValueFn,
    pub turn_off: ActionFn,
}

// ── Value extractors ────────────────────────────────────────────────

fn timer_end(c: &Coordinator) -> EntityValue {
    let data = c.read_api().data();
    if data.timer_on() && data.timeremaining > 0 {
        EntityValue::Timestamp(Utc::now() + TimeDelta::seconds(i64::from(data.timeremaining)))
    } else {
        EntityValue::None
    }
}

fn downtime(c: &Coordinator) -> EntityValue {
    let data = c.read_api().data();
    if data.downtime == 0 {
        EntityValue::None
    } else {
        EntityValue::Timestamp(Utc::now() - TimeDelta::seconds(to_i64(data.downtime)))
    }
}

fn uptime(c: &Coordinator) -> EntityValue {
    let data = c.read_api().data();
    EntityValue::Timestamp(Utc::now() - TimeDelta::seconds(to_i64(data.uptime)))
}

fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

// ── Actions ─────────────────────────────────────────────────────────
//
// All command actions follow the same shape: send through the control
// transport, then nudge the refresh task so the snapshot catches up.

fn flame_on(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().flame_on().await?;
        c.request_refresh();
        Ok(())
    })
}

fn flame_off(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().flame_off().await?;
        c.request_refresh();
        Ok(())
    })
}

fn pilot_on(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().pilot_on().await?;
        c.request_refresh();
        Ok(())
    })
}

fn pilot_off(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().pilot_off().await?;
        c.request_refresh();
        Ok(())
    })
}

fn read_mode_cloud(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.set_read_mode(ApiMode::Cloud).await;
        Ok(())
    })
}

fn read_mode_local(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.set_read_mode(ApiMode::Local).await;
        Ok(())
    })
}

fn control_mode_cloud(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.set_control_mode(ApiMode::Cloud).await;
        Ok(())
    })
}

fn control_mode_local(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.set_control_mode(ApiMode::Local).await;
        Ok(())
    })
}

/// UI flame height is 1-5; the wire speaks 0-4.
fn set_flame_height_ui(c: &Coordinator, value: f64) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let raw = (value.round().clamp(1.0, 5.0) as u8) - 1;
        c.control_api().set_flame_height(raw).await?;
        c.request_refresh();
        Ok(())
    })
}

fn set_fan_speed(c: &Coordinator, speed: u8) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().set_fan_speed(speed).await?;
        c.request_refresh();
        Ok(())
    })
}

fn fan_off(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().fan_off().await?;
        c.request_refresh();
        Ok(())
    })
}

fn set_light_level(c: &Coordinator, level: u8) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().set_light_level(level).await?;
        c.request_refresh();
        Ok(())
    })
}

fn light_off(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().set_light_level(0).await?;
        c.request_refresh();
        Ok(())
    })
}

fn set_thermostat_target(c: &Coordinator, celsius: f64) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().set_thermostat_c(celsius).await?;
        c.request_refresh();
        Ok(())
    })
}

fn thermostat_off(c: &Coordinator) -> BoxFuture<'_, Result<(), CoreError>> {
    Box::pin(async move {
        c.control_api().turn_off_thermostat().await?;
        c.request_refresh();
        Ok(())
    })
}

// ── Tables ──────────────────────────────────────────────────────────

pub static SENSORS: &[SensorDescriptor] = &[
    SensorDescriptor {
        key: "flame_height",
        name: "Flame height",
        device_class: None,
        diagnostic: false,
        // Wire height is 0-4; every display surface shows 1-5.
        value: |c| EntityValue::Int(i64::from(c.read_api().data().height) + 1),
    },
    SensorDescriptor {
        key: "temperature",
        name: "Temperature",
        device_class: Some("temperature"),
        diagnostic: false,
        value: |c| EntityValue::Float(c.read_api().data().temperature_c()),
    },
    SensorDescriptor {
        key: "target_temp",
        name: "Target temperature",
        device_class: Some("temperature"),
        diagnostic: false,
        value: |c| EntityValue::Float(c.read_api().data().thermostat_setpoint_c()),
    },
    SensorDescriptor {
        key: "fan_speed",
        name: "Fan speed",
        device_class: None,
        diagnostic: false,
        value: |c| EntityValue::Int(i64::from(c.read_api().data().fanspeed)),
    },
    SensorDescriptor {
        key: "timer_end_timestamp",
        name: "Timer end",
        device_class: Some("timestamp"),
        diagnostic: false,
        value: timer_end,
    },
    SensorDescriptor {
        key: "downtime",
        name: "Downtime",
        device_class: Some("timestamp"),
        diagnostic: true,
        value: downtime,
    },
    SensorDescriptor {
        key: "uptime",
        name: "Uptime",
        device_class: Some("timestamp"),
        diagnostic: true,
        value: uptime,
    },
    SensorDescriptor {
        key: "connection_quality",
        name: "Connection quality",
        device_class: None,
        diagnostic: true,
        value: |c| EntityValue::Int(to_i64(c.read_api().data().connection_quality)),
    },
    SensorDescriptor {
        key: "ecm_latency",
        name: "ECM latency",
        device_class: None,
        diagnostic: true,
        value: |c| EntityValue::Int(to_i64(c.read_api().data().ecm_latency)),
    },
    SensorDescriptor {
        key: "ipv4_address",
        name: "IP address",
        device_class: None,
        diagnostic: true,
        value: |c| EntityValue::Text(c.read_api().data().ipv4_address),
    },
    SensorDescriptor {
        key: "read_mode",
        name: "Read mode",
        device_class: None,
        diagnostic: true,
        value: |c| EntityValue::Text(c.read_mode().as_str().to_owned()),
    },
    SensorDescriptor {
        key: "control_mode",
        name: "Control mode",
        device_class: None,
        diagnostic: true,
        value: |c| EntityValue::Text(c.control_mode().as_str().to_owned()),
    },
];

pub static BINARY_SENSORS: &[BinarySensorDescriptor] = &[
    BinarySensorDescriptor {
        key: "flame",
        name: "Flame",
        device_class: None,
        diagnostic: false,
        value: |c| c.read_api().data().is_on(),
    },
    BinarySensorDescriptor {
        key: "timer_on",
        name: "Timer on",
        device_class: None,
        diagnostic: false,
        value: |c| c.read_api().data().timer_on(),
    },
    BinarySensorDescriptor {
        key: "pilot_light_on",
        name: "Pilot light on",
        device_class: None,
        diagnostic: false,
        value: |c| c.read_api().data().pilot_on(),
    },
    BinarySensorDescriptor {
        key: "thermostat_on",
        name: "Thermostat on",
        device_class: None,
        diagnostic: false,
        value: |c| c.read_api().data().thermostat_on(),
    },
    BinarySensorDescriptor {
        key: "error_pilot_flame",
        name: "Pilot flame error",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::PilotFlame),
    },
    BinarySensorDescriptor {
        key: "error_flame",
        name: "Flame error",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::Flame),
    },
    BinarySensorDescriptor {
        key: "error_fan_delay",
        name: "Fan delay error",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::FanDelay),
    },
    BinarySensorDescriptor {
        key: "error_maintenance",
        name: "Maintenance required",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::Maintenance),
    },
    BinarySensorDescriptor {
        key: "error_disabled",
        name: "Disabled",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::Disabled),
    },
    BinarySensorDescriptor {
        key: "error_fan",
        name: "Fan error",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::Fan),
    },
    BinarySensorDescriptor {
        key: "error_lights",
        name: "Lights error",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::Lights),
    },
    BinarySensorDescriptor {
        key: "error_accessory",
        name: "Accessory error",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::Accessory),
    },
    BinarySensorDescriptor {
        key: "error_offline",
        name: "Offline",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::Offline),
    },
    BinarySensorDescriptor {
        key: "error_ecm_offline",
        name: "ECM offline",
        device_class: Some("problem"),
        diagnostic: true,
        value: |c| c.read_api().data().has_error(ErrorCode::EcmOffline),
    },
];

pub static SWITCHES: &[SwitchDescriptor] = &[
    SwitchDescriptor {
        key: "on_off",
        name: "Flame",
        value: |c| c.read_api().data().is_on(),
        turn_on: flame_on,
        turn_off: flame_off,
    },
    SwitchDescriptor {
        key: "pilot",
        name: "Pilot light",
        value: |c| c.read_api().data().pilot_on(),
        turn_on: pilot_on,
        turn_off: pilot_off,
    },
    SwitchDescriptor {
        key: "cloud_read",
        name: "Cloud read",
        value: |c| c.read_mode() == ApiMode::Cloud,
        turn_on: read_mode_cloud,
        turn_off: read_mode_local,
    },
    SwitchDescriptor {
        key: "cloud_control",
        name: "Cloud control",
        value: |c| c.control_mode() == ApiMode::Cloud,
        turn_on: control_mode_cloud,
        turn_off: control_mode_local,
    },
];

pub static NUMBERS: &[NumberDescriptor] = &[NumberDescriptor {
    key: "flame_control",
    name: "Flame control",
    min: 1.0,
    max: 5.0,
    step: 1.0,
    value: |c| EntityValue::Int(i64::from(c.read_api().data().height) + 1),
    set: set_flame_height_ui,
}];

pub static FAN: FanDescriptor = FanDescriptor {
    key: "fan",
    name: "Fan",
    max_speed: 4,
    supported: |c| c.read_api().data().has_fan(),
    speed: |c| EntityValue::Int(i64::from(c.read_api().data().fanspeed)),
    set_speed: set_fan_speed,
    turn_off: fan_off,
};

pub static LIGHT: LightDescriptor = LightDescriptor {
    key: "lights",
    name: "Lights",
    max_level: 3,
    supported: |c| c.read_api().data().has_light(),
    level: |c| EntityValue::Int(i64::from(c.read_api().data().light)),
    set_level: set_light_level,
    turn_off: light_off,
};

pub static CLIMATE: ClimateDescriptor = ClimateDescriptor {
    key: "climate",
    name: "Thermostat",
    min_temp_c: 0.0,
    max_temp_c: 37.0,
    supported: |c| c.read_api().data().has_thermostat(),
    active: |c| c.read_api().data().thermostat_on(),
    current_temp: |c| EntityValue::Float(c.read_api().data().temperature_c()),
    target_temp: |c| EntityValue::Float(c.read_api().data().thermostat_setpoint_c()),
    set_target: set_thermostat_target,
    turn_off: thermostat_off,
};
