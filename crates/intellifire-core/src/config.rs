// ── Runtime fireplace configuration ──
//
// These types describe *how* to reach one fireplace. They carry credential
// data and tuning knobs, but never touch disk -- `intellifire-config`
// resolves files/env into a `FireplaceConfig` and hands it in.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Which transport serves an operation.
///
/// Read mode and control mode are independent: status reads can come from
/// the cloud while commands go over the LAN, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    #[default]
    Local,
    Cloud,
}

impl ApiMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "cloud" => Ok(Self::Cloud),
            other => Err(format!("unknown api mode '{other}' (expected local|cloud)")),
        }
    }
}

/// Configuration for one fireplace.
///
/// `username`/`password` are the cloud account credentials; `api_key` and
/// `user_id` are the per-fireplace local-signing material. When the latter
/// are absent, setup recovers them through a cloud login.
#[derive(Debug, Clone)]
pub struct FireplaceConfig {
    /// LAN host/IP of the module.
    pub host: String,
    /// Cloud account credentials.
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Local command-signing secret (hex), recovered from the cloud when absent.
    pub api_key: Option<SecretString>,
    /// Cloud user id, recovered from the cloud when absent.
    pub user_id: Option<String>,
    /// Serial to select among the account's fireplaces.
    pub serial: Option<String>,
    /// Which transport serves status reads.
    pub read_mode: ApiMode,
    /// Which transport serves commands.
    pub control_mode: ApiMode,
    /// Coordinator refresh cadence.
    pub refresh_interval: Duration,
    /// Bound on the forced first local poll during a refresh.
    pub local_poll_timeout: Duration,
    /// Cadence of the placeholder-identity wait loop at setup.
    pub init_poll_interval: Duration,
    /// Bound on the placeholder-identity wait loop.
    pub init_timeout: Duration,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Cloud relay base URL override (tests; `None` = production relay).
    pub cloud_base: Option<String>,
}

impl Default for FireplaceConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.80".into(),
            username: None,
            password: None,
            api_key: None,
            user_id: None,
            serial: None,
            read_mode: ApiMode::Local,
            control_mode: ApiMode::Local,
            refresh_interval: Duration::from_secs(15),
            local_poll_timeout: Duration::from_secs(15),
            init_poll_interval: Duration::from_secs(10),
            init_timeout: Duration::from_secs(600),
            http_timeout: Duration::from_secs(30),
            cloud_base: None,
        }
    }
}
