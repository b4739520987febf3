// ── Poll document model ──
//
// One `PollData` is the fully-parsed status snapshot a transport caches
// after each successful poll. The local module and the cloud relay serve
// the same JSON document, so a single model covers both. Snapshots are
// replaced wholesale -- no field-level merging.

use serde::{Deserialize, Serialize};

/// Serial number reported by a factory-default module before provisioning.
pub const PLACEHOLDER_SERIAL: &str = "unset";

/// Link-local prefix reported before the module has a DHCP lease.
pub const PLACEHOLDER_IPV4_PREFIX: &str = "169.254";

/// Latest fully-parsed device status, as served by `GET /poll` on the
/// module or `apppoll` on the cloud relay.
///
/// Raw integer flags are kept as deserialized; use the accessor methods
/// (`is_on()`, `thermostat_setpoint_c()`, ...) for interpreted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollData {
    pub name: String,
    pub serial: String,
    /// Room temperature in whole degrees Celsius.
    pub temperature: i32,
    pub battery: u32,
    pub pilot: u8,
    /// Accent light level, 0-3.
    pub light: u8,
    /// Flame height, 0-4 (UI surfaces render this as 1-5).
    pub height: u8,
    /// Fan speed, 0-4.
    pub fanspeed: u8,
    /// Nonzero while the firebox is still hot after shutdown.
    pub hot: u8,
    /// Main burner state: 1 = flame on.
    pub power: u8,
    /// Thermostat mode active.
    pub thermostat: u8,
    /// Thermostat setpoint in centi-degrees Celsius (e.g. 2100 = 21.0 C).
    pub setpoint: u32,
    /// Sleep timer armed.
    pub timer: u8,
    /// Seconds left on the sleep timer.
    pub timeremaining: u32,
    /// Pre-purge cycle running before ignition.
    pub prepurge: u8,
    pub feature_light: u8,
    pub feature_thermostat: u8,
    pub power_vent: u8,
    pub feature_fan: u8,
    /// Raw fault codes currently asserted by the module.
    pub errors: Vec<u16>,
    pub fw_version: String,
    pub fw_ver_str: String,
    /// Seconds since the module lost contact with the ECM (0 = in contact).
    pub downtime: u64,
    pub uptime: u64,
    pub connection_quality: u64,
    pub ecm_latency: u64,
    pub ipv4_address: String,
}

impl Default for PollData {
    fn default() -> Self {
        Self {
            name: String::new(),
            serial: PLACEHOLDER_SERIAL.to_owned(),
            temperature: 0,
            battery: 0,
            pilot: 0,
            light: 0,
            height: 0,
            fanspeed: 0,
            hot: 0,
            power: 0,
            thermostat: 0,
            setpoint: 0,
            timer: 0,
            timeremaining: 0,
            prepurge: 0,
            feature_light: 0,
            feature_thermostat: 0,
            power_vent: 0,
            feature_fan: 0,
            errors: Vec::new(),
            fw_version: String::new(),
            fw_ver_str: String::new(),
            downtime: 0,
            uptime: 0,
            connection_quality: 0,
            ecm_latency: 0,
            ipv4_address: format!("{PLACEHOLDER_IPV4_PREFIX}.1.1"),
        }
    }
}

impl PollData {
    /// Main burner is lit.
    pub fn is_on(&self) -> bool {
        self.power == 1
    }

    /// Pilot light is on.
    pub fn pilot_on(&self) -> bool {
        self.pilot == 1
    }

    /// Thermostat mode is active.
    pub fn thermostat_on(&self) -> bool {
        self.thermostat == 1
    }

    /// Sleep timer is armed.
    pub fn timer_on(&self) -> bool {
        self.timer == 1
    }

    /// Firebox still hot after shutdown.
    pub fn is_hot(&self) -> bool {
        self.hot == 1
    }

    /// Pre-purge cycle running.
    pub fn is_prepurging(&self) -> bool {
        self.prepurge == 1
    }

    pub fn has_light(&self) -> bool {
        self.feature_light == 1
    }

    pub fn has_thermostat(&self) -> bool {
        self.feature_thermostat == 1
    }

    pub fn has_fan(&self) -> bool {
        self.feature_fan == 1
    }

    pub fn has_power_vent(&self) -> bool {
        self.power_vent == 1
    }

    /// Room temperature in Celsius.
    pub fn temperature_c(&self) -> f64 {
        f64::from(self.temperature)
    }

    /// Thermostat setpoint in Celsius (wire value is centi-degrees).
    pub fn thermostat_setpoint_c(&self) -> f64 {
        f64::from(self.setpoint) / 100.0
    }

    /// Decoded fault codes.
    pub fn error_codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|&c| ErrorCode::from_code(c)).collect()
    }

    /// Whether a specific fault is currently asserted.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.error_codes().contains(&code)
    }

    /// Whether the module has left its factory-default identity.
    ///
    /// A fresh module reports serial [`PLACEHOLDER_SERIAL`] and a
    /// link-local address until it is provisioned; setup busy-waits on
    /// this before trusting the serial for device identity.
    pub fn has_identity(&self) -> bool {
        self.serial != PLACEHOLDER_SERIAL
            && !self.ipv4_address.starts_with(PLACEHOLDER_IPV4_PREFIX)
    }
}

/// Fault codes reported in the poll document's `errors` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Flame,
    PilotFlame,
    FanDelay,
    Maintenance,
    Disabled,
    Offline,
    Fan,
    Lights,
    Accessory,
    EcmOffline,
    Unknown(u16),
}

impl ErrorCode {
    pub fn from_code(code: u16) -> Self {
        match code {
            2 => Self::Flame,
            4 => Self::PilotFlame,
            6 => Self::FanDelay,
            64 => Self::Maintenance,
            129 => Self::Disabled,
            642 => Self::Offline,
            3264 => Self::Fan,
            3269 => Self::Lights,
            3270 => Self::Accessory,
            3485 => Self::EcmOffline,
            other => Self::Unknown(other),
        }
    }

    /// Stable key for entity naming / diagnostics.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Flame => "flame",
            Self::PilotFlame => "pilot_flame",
            Self::FanDelay => "fan_delay",
            Self::Maintenance => "maintenance",
            Self::Disabled => "disabled",
            Self::Offline => "offline",
            Self::Fan => "fan",
            Self::Lights => "lights",
            Self::Accessory => "accessory",
            Self::EcmOffline => "ecm_offline",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Human-readable fault description.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Flame => "Burner failed to ignite or flame was lost",
            Self::PilotFlame => "Pilot flame error",
            Self::FanDelay => "Fan is in its post-shutdown delay cycle",
            Self::Maintenance => "Maintenance required",
            Self::Disabled => "Fireplace is disabled",
            Self::Offline => "Module is offline",
            Self::Fan => "Fan error",
            Self::Lights => "Accent light error",
            Self::Accessory => "Accessory error",
            Self::EcmOffline => "ECM is offline",
            Self::Unknown(_) => "Unknown fault code",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LOCAL_POLL: &str = r#"{
        "name": "",
        "serial": "BD0E054B5D6DF7AFBC8F9B28C9011111",
        "temperature": 17,
        "battery": 0,
        "pilot": 1,
        "light": 3,
        "height": 4,
        "fanspeed": 1,
        "hot": 0,
        "power": 1,
        "thermostat": 0,
        "setpoint": 0,
        "timer": 0,
        "timeremaining": 0,
        "prepurge": 0,
        "feature_light": 1,
        "feature_thermostat": 1,
        "power_vent": 0,
        "feature_fan": 1,
        "errors": [3269],
        "fw_version": "0x01030000",
        "fw_ver_str": "1.3.0.0",
        "downtime": 0,
        "uptime": 117,
        "connection_quality": 995871,
        "ecm_latency": 0,
        "ipv4_address": "192.168.1.80"
    }"#;

    #[test]
    fn parses_local_poll_document() {
        let data: PollData = serde_json::from_str(LOCAL_POLL).expect("valid poll doc");
        assert!(data.is_on());
        assert!(data.pilot_on());
        assert!(!data.thermostat_on());
        assert_eq!(data.height, 4);
        assert_eq!(data.temperature_c(), 17.0);
        assert_eq!(data.error_codes(), vec![ErrorCode::Lights]);
        assert!(data.has_identity());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let data: PollData = serde_json::from_str(r#"{"power": 1}"#).expect("partial doc");
        assert!(data.is_on());
        assert_eq!(data.serial, PLACEHOLDER_SERIAL);
        assert!(!data.has_identity());
    }

    #[test]
    fn default_snapshot_is_placeholder() {
        let data = PollData::default();
        assert!(!data.has_identity());
        assert!(data.ipv4_address.starts_with(PLACEHOLDER_IPV4_PREFIX));
    }

    #[test]
    fn setpoint_converts_from_centidegrees() {
        let data = PollData {
            setpoint: 2150,
            ..PollData::default()
        };
        assert_eq!(data.thermostat_setpoint_c(), 21.5);
    }

    #[test]
    fn unknown_error_codes_are_preserved() {
        assert_eq!(ErrorCode::from_code(9999), ErrorCode::Unknown(9999));
        assert_eq!(ErrorCode::from_code(642), ErrorCode::Offline);
    }
}
