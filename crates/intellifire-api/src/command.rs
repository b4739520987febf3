// ── Typed fireplace commands ──
//
// Every control operation on either transport is one of these. Values are
// validated client-side against the ranges the module accepts; the wire
// representation is a `command=<name>&value=<n>` pair on both the local
// `/post` endpoint and the cloud `apppost` endpoint.

use crate::error::Error;

/// Maximum thermostat setpoint in centi-degrees Celsius (37.0 C).
pub const MAX_THERMOSTAT_SETPOINT: u32 = 3700;

/// Maximum sleep timer duration in seconds (3 hours).
pub const MAX_SLEEP_TIMER_SECS: u32 = 10800;

/// A control command accepted by the fireplace module.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireplaceCommand {
    /// Main burner on/off.
    Power(bool),
    /// Pilot light on/off.
    Pilot(bool),
    /// Flame height, 0-4.
    FlameHeight(u8),
    /// Fan speed, 0-4 (0 = off).
    FanSpeed(u8),
    /// Accent light level, 0-3 (0 = off).
    LightLevel(u8),
    /// Thermostat setpoint in degrees Celsius. 0 disables the thermostat.
    ThermostatSetpoint(f64),
    /// Sleep timer in seconds. 0 cancels the timer.
    TimeRemaining(u32),
    /// Audible beep.
    Beep,
    /// Soft-reset the module.
    SoftReset,
}

impl FireplaceCommand {
    /// The `command=` name on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Power(_) => "power",
            Self::Pilot(_) => "pilot",
            Self::FlameHeight(_) => "height",
            Self::FanSpeed(_) => "fanspeed",
            Self::LightLevel(_) => "light",
            Self::ThermostatSetpoint(_) => "thermostat_setpoint",
            Self::TimeRemaining(_) => "time_remaining",
            Self::Beep => "beep",
            Self::SoftReset => "soft_reset",
        }
    }

    /// The `value=` integer on the wire.
    pub fn wire_value(&self) -> u32 {
        match self {
            Self::Power(on) | Self::Pilot(on) => u32::from(*on),
            Self::FlameHeight(v) | Self::FanSpeed(v) | Self::LightLevel(v) => u32::from(*v),
            // Wire unit is centi-degrees.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Self::ThermostatSetpoint(c) => (c.max(0.0) * 100.0).round() as u32,
            Self::TimeRemaining(secs) => *secs,
            Self::Beep | Self::SoftReset => 1,
        }
    }

    /// The inclusive value range the module accepts for this command.
    fn value_range(&self) -> (u32, u32) {
        match self {
            Self::Power(_) | Self::Pilot(_) => (0, 1),
            Self::FlameHeight(_) | Self::FanSpeed(_) => (0, 4),
            Self::LightLevel(_) => (0, 3),
            Self::ThermostatSetpoint(_) => (0, MAX_THERMOSTAT_SETPOINT),
            Self::TimeRemaining(_) => (0, MAX_SLEEP_TIMER_SECS),
            Self::Beep | Self::SoftReset => (1, 1),
        }
    }

    /// Validate the value against the module's accepted range.
    pub fn validate(&self) -> Result<(), Error> {
        let value = self.wire_value();
        let (min, max) = self.value_range();
        if value < min || value > max {
            return Err(Error::InvalidValue {
                command: self.wire_name(),
                value,
                min,
                max,
            });
        }
        // The sleep timer only accepts whole minutes.
        if let Self::TimeRemaining(secs) = self {
            if secs % 60 != 0 {
                return Err(Error::InvalidValue {
                    command: self.wire_name(),
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_round_trip() {
        assert_eq!(FireplaceCommand::Power(true).wire_value(), 1);
        assert_eq!(FireplaceCommand::Power(false).wire_value(), 0);
        assert_eq!(FireplaceCommand::ThermostatSetpoint(21.5).wire_value(), 2150);
        assert_eq!(FireplaceCommand::Beep.wire_name(), "beep");
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(FireplaceCommand::FlameHeight(5).validate().is_err());
        assert!(FireplaceCommand::LightLevel(4).validate().is_err());
        assert!(
            FireplaceCommand::ThermostatSetpoint(40.0)
                .validate()
                .is_err()
        );
        assert!(FireplaceCommand::FanSpeed(4).validate().is_ok());
    }

    #[test]
    fn sleep_timer_requires_whole_minutes() {
        assert!(FireplaceCommand::TimeRemaining(90).validate().is_err());
        assert!(FireplaceCommand::TimeRemaining(120).validate().is_ok());
        assert!(FireplaceCommand::TimeRemaining(0).validate().is_ok());
    }
}
