//! Clap derive structures for the `firectl` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use intellifire_core::ApiMode;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// firectl -- control IntelliFire fireplaces from the command line
#[derive(Debug, Parser)]
#[command(
    name = "firectl",
    version,
    about = "Control IntelliFire WiFi fireplaces",
    long_about = "Control IntelliFire WiFi fireplace modules over the LAN or the\n\
        vendor cloud, with independent read/control transport selection.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Fireplace profile to use
    #[arg(long, short = 'f', env = "FIRECTL_PROFILE", global = true)]
    pub fireplace: Option<String>,

    /// Config file path override
    #[arg(long, env = "FIRECTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// LAN host/IP of the module (overrides profile)
    #[arg(long, env = "FIRECTL_HOST", global = true)]
    pub host: Option<String>,

    /// Cloud account email (overrides profile)
    #[arg(long, env = "FIRECTL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(long, short = 'o', default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// Pretty-printed JSON
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current fireplace status
    #[command(alias = "st")]
    Status,

    /// Stream status updates as they arrive
    Watch(WatchArgs),

    /// Turn the flame on or off
    Flame { state: OnOff },

    /// Turn the pilot light on or off
    Pilot { state: OnOff },

    /// Set flame height (1-5)
    Height {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        level: u8,
    },

    /// Set fan speed (0-4, 0 = off)
    Fan {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=4))]
        speed: u8,
    },

    /// Set accent light level (0-3, 0 = off)
    Light {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=3))]
        level: u8,
    },

    /// Thermostat control
    #[command(alias = "thermo")]
    Thermostat {
        #[command(subcommand)]
        action: ThermostatAction,
    },

    /// Sleep timer control
    Timer {
        #[command(subcommand)]
        action: TimerAction,
    },

    /// Beep the module
    Beep,

    /// Show or change transport modes
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OnOff {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum ThermostatAction {
    /// Set the target temperature in degrees Celsius
    Set { celsius: f64 },
    /// Turn the thermostat off
    Off,
}

#[derive(Debug, Subcommand)]
pub enum TimerAction {
    /// Arm the sleep timer (minutes, up to 180)
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=180))]
        minutes: u32,
    },
    /// Cancel the sleep timer
    Off,
}

#[derive(Debug, Subcommand)]
pub enum ModeAction {
    /// Show the current read and control modes
    Show,
    /// Select the transport serving status reads
    Read { mode: ModeArg },
    /// Select the transport serving commands
    Control { mode: ModeArg },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// The module's LAN HTTP server
    Local,
    /// The vendor cloud relay
    Cloud,
}

impl From<ModeArg> for ApiMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Local => Self::Local,
            ModeArg::Cloud => Self::Cloud,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write a starter config file
    Init,
    /// Print the resolved configuration
    Show,
    /// Print the config file path
    Path,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn height_rejects_out_of_range_values() {
        assert!(Cli::try_parse_from(["firectl", "height", "6"]).is_err());
        assert!(Cli::try_parse_from(["firectl", "height", "0"]).is_err());
        assert!(Cli::try_parse_from(["firectl", "height", "5"]).is_ok());
    }

    #[test]
    fn mode_subcommands_parse() {
        let cli = Cli::try_parse_from(["firectl", "mode", "control", "cloud"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Mode {
                action: ModeAction::Control {
                    mode: ModeArg::Cloud
                }
            }
        ));
    }
}
