use thiserror::Error;

/// Failure modes of setup and coordination.
///
/// The three setup/refresh outcomes are deliberately distinct: `AuthRequired`
/// means retrying is pointless until the user re-enters credentials,
/// `NotReady` means the same setup should simply be retried later, and
/// `UpdateFailed` marks one refresh cycle as stale without tearing anything
/// down.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Credentials are missing or were rejected; user action is needed.
    #[error("Authentication required: {message}")]
    AuthRequired { message: String },

    /// The fireplace is not reachable yet; setup should be retried.
    #[error("Fireplace not ready: {message}")]
    NotReady { message: String },

    /// One refresh cycle failed; the cached snapshot is stale.
    #[error("Update failed: {message}")]
    UpdateFailed { message: String },

    /// Configuration is incomplete or inconsistent.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A transport-level error outside the refresh path (commands, mostly).
    #[error(transparent)]
    Api(#[from] intellifire_api::Error),
}

impl CoreError {
    pub fn update_failed(message: impl Into<String>) -> Self {
        Self::UpdateFailed {
            message: message.into(),
        }
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady {
            message: message.into(),
        }
    }

    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::AuthRequired {
            message: message.into(),
        }
    }
}
