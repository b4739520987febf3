//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and transport errors into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use intellifire_config::ConfigError;
use intellifire_core::CoreError;

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_READY: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication required: {message}")]
    #[diagnostic(
        code(firectl::auth_required),
        help(
            "Check the cloud username/password in your profile.\n\
             Run: firectl config show"
        )
    )]
    AuthRequired { message: String },

    // ── Reachability ─────────────────────────────────────────────────
    #[error("Fireplace not ready: {message}")]
    #[diagnostic(
        code(firectl::not_ready),
        help("The fireplace or the cloud relay is unreachable right now; try again shortly.")
    )]
    NotReady { message: String },

    #[error("Could not reach the fireplace: {message}")]
    #[diagnostic(
        code(firectl::connection),
        help("Check the `host` in your profile and that the module is on the network.")
    )]
    Connection { message: String },

    #[error("Status refresh failed: {message}")]
    #[diagnostic(code(firectl::update_failed))]
    UpdateFailed { message: String },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Command failed: {message}")]
    #[diagnostic(code(firectl::command))]
    Command { message: String },

    // ── Validation / configuration ───────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(firectl::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(firectl::config))]
    Config(#[from] ConfigError),

    #[error("No fireplace configured")]
    #[diagnostic(
        code(firectl::no_config),
        help(
            "Create a config with: firectl config init\n\
             Or pass --host and FIRECTL_USERNAME/FIRECTL_PASSWORD."
        )
    )]
    NoConfig,

    // ── IO / serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthRequired { .. } => exit_code::AUTH,
            Self::NotReady { .. } => exit_code::NOT_READY,
            Self::Connection { .. } => exit_code::CONNECTION,
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoConfig => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthRequired { message } => Self::AuthRequired { message },
            CoreError::NotReady { message } => Self::NotReady { message },
            CoreError::UpdateFailed { message } => Self::UpdateFailed { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Api(e) => e.into(),
        }
    }
}

impl From<intellifire_api::Error> for CliError {
    fn from(err: intellifire_api::Error) -> Self {
        if err.is_auth_error() {
            Self::AuthRequired {
                message: err.to_string(),
            }
        } else if err.is_transient() {
            Self::Connection {
                message: err.to_string(),
            }
        } else {
            Self::Command {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_outcomes() {
        let auth = CliError::from(CoreError::AuthRequired {
            message: "bad credentials".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let not_ready = CliError::from(CoreError::NotReady {
            message: "offline".into(),
        });
        assert_eq!(not_ready.exit_code(), exit_code::NOT_READY);

        let usage = CliError::NoConfig;
        assert_eq!(usage.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn api_errors_map_by_kind() {
        let auth = CliError::from(intellifire_api::Error::SessionExpired);
        assert!(matches!(auth, CliError::AuthRequired { .. }));

        let conn = CliError::from(intellifire_api::Error::Timeout { timeout_secs: 30 });
        assert!(matches!(conn, CliError::Connection { .. }));

        let cmd = CliError::from(intellifire_api::Error::CommandRejected { status: 403 });
        assert!(matches!(cmd, CliError::Command { .. }));
    }
}
