// ── Transport traits ──
//
// The coordinator in `intellifire-core` holds two transports and never
// cares which is which: reads go through `FireplaceReadSource`, writes
// through `FireplaceController`. Both `LocalApi` and `CloudApi` implement
// both traits; `FireplaceApi` is the combined object the coordinator
// arbitrates between.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::command::FireplaceCommand;
use crate::error::Error;
use crate::model::PollData;

/// Status-read surface of a transport.
///
/// Each transport caches the last successful snapshot and can run its own
/// fire-and-forget background polling task. The task is owned by the
/// transport, not by callers -- callers only start/stop it and read the
/// cached snapshot.
#[async_trait]
pub trait FireplaceReadSource: Send + Sync {
    /// Perform one poll now, replacing the cached snapshot on success.
    ///
    /// On failure the consecutive-failure counter is incremented; on
    /// success it resets to zero.
    async fn poll(&self) -> Result<(), Error>;

    /// The last cached snapshot (placeholder defaults before first poll).
    fn data(&self) -> PollData;

    /// Subscribe to snapshot replacements.
    fn subscribe(&self) -> watch::Receiver<PollData>;

    /// Whether this transport's background polling task is running.
    fn is_polling_in_background(&self) -> bool;

    /// Start the background polling task. Returns `false` if it was
    /// already running (the task is never started twice).
    async fn start_background_polling(&self) -> bool;

    /// Stop the background polling task and wait for it to exit.
    /// Returns `false` if it was not running.
    async fn stop_background_polling(&self) -> bool;

    /// Replace the cached snapshot with one taken from another transport.
    ///
    /// Used during control-mode handover so the newly active transport
    /// does not serve stale or empty data before its first own poll.
    fn overwrite_data(&self, data: PollData);

    /// Consecutive failed poll attempts since the last success.
    fn failed_poll_attempts(&self) -> u32;
}

/// Command surface of a transport.
///
/// The convenience methods all route through [`send_command`]
/// (Self::send_command); implementations only provide that one.
#[async_trait]
pub trait FireplaceController: Send + Sync {
    /// Validate and send a single command.
    async fn send_command(&self, command: FireplaceCommand) -> Result<(), Error>;

    async fn flame_on(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::Power(true)).await
    }

    async fn flame_off(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::Power(false)).await
    }

    async fn pilot_on(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::Pilot(true)).await
    }

    async fn pilot_off(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::Pilot(false)).await
    }

    async fn set_flame_height(&self, height: u8) -> Result<(), Error> {
        self.send_command(FireplaceCommand::FlameHeight(height)).await
    }

    async fn set_fan_speed(&self, speed: u8) -> Result<(), Error> {
        self.send_command(FireplaceCommand::FanSpeed(speed)).await
    }

    async fn fan_off(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::FanSpeed(0)).await
    }

    async fn set_light_level(&self, level: u8) -> Result<(), Error> {
        self.send_command(FireplaceCommand::LightLevel(level)).await
    }

    async fn set_thermostat_c(&self, celsius: f64) -> Result<(), Error> {
        self.send_command(FireplaceCommand::ThermostatSetpoint(celsius))
            .await
    }

    async fn turn_off_thermostat(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::ThermostatSetpoint(0.0))
            .await
    }

    async fn set_sleep_timer(&self, seconds: u32) -> Result<(), Error> {
        self.send_command(FireplaceCommand::TimeRemaining(seconds))
            .await
    }

    async fn stop_sleep_timer(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::TimeRemaining(0)).await
    }

    async fn beep(&self) -> Result<(), Error> {
        self.send_command(FireplaceCommand::Beep).await
    }
}

/// A full transport: status reads plus control writes.
pub trait FireplaceApi: FireplaceReadSource + FireplaceController {}

impl<T: FireplaceReadSource + FireplaceController> FireplaceApi for T {}
