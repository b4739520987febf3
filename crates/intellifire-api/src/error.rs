use thiserror::Error;

/// Top-level error type for the `intellifire-api` crate.
///
/// Covers every failure mode across both transports: authentication,
/// HTTP transport, command rejection, and payload decoding.
/// `intellifire-core` maps these into setup/refresh outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Cloud login rejected (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Cloud session cookie expired or missing.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// Operation requires a logged-in cloud session.
    #[error("Not logged in to the cloud API")]
    NotLoggedIn,

    /// The stored API key is not valid hex / was rejected by the module.
    #[error("Invalid API key: {message}")]
    InvalidApiKey { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Commands ────────────────────────────────────────────────────
    /// Command value outside the range the module accepts.
    #[error("Invalid value {value} for {command} (allowed {min}..={max})")]
    InvalidValue {
        command: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// The module (or cloud relay) rejected a command POST.
    #[error("Command rejected (HTTP {status})")]
    CommandRejected { status: u16 },

    /// The `/get_challenge` handshake returned an unusable challenge.
    #[error("Challenge handshake failed: {message}")]
    ChallengeFailed { message: String },

    // ── Polling ─────────────────────────────────────────────────────
    /// The poll endpoint answered with a non-success status.
    #[error("Poll endpoint returned HTTP {status}")]
    PollHttp { status: u16 },

    // ── Cloud enumeration ───────────────────────────────────────────
    /// The cloud account has no registered fireplaces.
    #[error("No fireplaces registered to this account")]
    NoFireplaces,

    /// Structured error from the cloud relay.
    #[error("Cloud API error (HTTP {status}): {message}")]
    CloudApi { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired or was
    /// rejected and re-authentication might resolve it.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::SessionExpired | Self::NotLoggedIn
        )
    }

    /// Returns `true` if this is a connectivity-shaped error -- the kind
    /// the coordinator reports as a generic update failure and retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
