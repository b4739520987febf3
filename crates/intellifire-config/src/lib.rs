//! Configuration for `firectl`.
//!
//! TOML fireplace profiles, credential resolution (env indirection +
//! plaintext), and translation to `intellifire_core::FireplaceConfig`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use intellifire_core::{ApiMode, FireplaceConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no fireplace profile named '{name}'")]
    UnknownProfile { name: String },

    #[error("no fireplace profiles configured (run `firectl config init`)")]
    NoProfiles,

    #[error(
        "several fireplace profiles configured and no default set; pick one with --fireplace"
    )]
    AmbiguousProfile,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--fireplace` is not given.
    pub default_fireplace: Option<String>,

    /// Tuning defaults shared by all profiles.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named fireplace profiles.
    #[serde(default, rename = "fireplace")]
    pub fireplaces: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Seconds between coordinator refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Per-request HTTP timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between identity polls at setup.
    #[serde(default = "default_init_poll_interval")]
    pub init_poll_interval: u64,

    /// Bound on the identity wait at setup, seconds.
    #[serde(default = "default_init_timeout")]
    pub init_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            timeout: default_timeout(),
            init_poll_interval: default_init_poll_interval(),
            init_timeout: default_init_timeout(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    15
}
fn default_timeout() -> u64 {
    30
}
fn default_init_poll_interval() -> u64 {
    10
}
fn default_init_timeout() -> u64 {
    600
}

/// A named fireplace profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// LAN host/IP of the module (e.g. "192.168.1.80").
    pub host: String,

    /// Cloud account email.
    pub username: Option<String>,

    /// Cloud account password (plaintext -- prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the cloud password.
    pub password_env: Option<String>,

    /// Local signing key (hex). Recovered from the cloud when absent.
    pub api_key: Option<String>,

    /// Environment variable holding the local signing key.
    pub api_key_env: Option<String>,

    /// Cloud user id. Recovered from the cloud when absent.
    pub user_id: Option<String>,

    /// Serial to select among the account's fireplaces.
    pub serial: Option<String>,

    /// Transport serving status reads.
    #[serde(default)]
    pub read_mode: ApiMode,

    /// Transport serving commands.
    #[serde(default)]
    pub control_mode: ApiMode,

    /// Override the shared refresh interval, seconds.
    pub refresh_interval: Option<u64>,

    /// Override the shared HTTP timeout, seconds.
    pub timeout: Option<u64>,

    /// Cloud relay base URL override (testing).
    pub cloud_base: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hearthside", "firectl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("firectl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full [`Config`] from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_at(&config_path())
}

/// Load the full [`Config`] from an explicit file + environment.
///
/// Environment overrides use double-underscore separators, e.g.
/// `FIRECTL_DEFAULT_FIREPLACE`, `FIRECTL_FIREPLACE__DEN__HOST`.
pub fn load_config_at(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FIRECTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the given path.
pub fn save_config_at(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// A starter config for `firectl config init`.
pub fn sample_config() -> Config {
    let mut fireplaces = BTreeMap::new();
    fireplaces.insert(
        "living-room".to_owned(),
        Profile {
            host: "192.168.1.80".to_owned(),
            username: Some("you@example.com".to_owned()),
            password_env: Some("IFT_PASSWORD".to_owned()),
            ..Profile::default()
        },
    );
    Config {
        default_fireplace: Some("living-room".to_owned()),
        defaults: Defaults::default(),
        fireplaces,
    }
}

// ── Profile selection ───────────────────────────────────────────────

/// Pick a profile: explicit name, then the configured default, then the
/// sole profile if there is exactly one.
pub fn select_profile<'a>(
    config: &'a Config,
    name: Option<&str>,
) -> Result<(&'a str, &'a Profile), ConfigError> {
    let lookup = |n: &str| {
        config
            .fireplaces
            .get_key_value(n)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: n.to_owned() })
    };

    if let Some(n) = name {
        return lookup(n);
    }
    if let Some(ref n) = config.default_fireplace {
        return lookup(n);
    }
    match config.fireplaces.len() {
        0 => Err(ConfigError::NoProfiles),
        1 => Ok(config
            .fireplaces
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .next()
            .ok_or(ConfigError::NoProfiles)?),
        _ => Err(ConfigError::AmbiguousProfile),
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the cloud password: profile's env indirection, then the
/// `FIRECTL_PASSWORD` variable, then plaintext in the profile.
pub fn resolve_password(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    if let Ok(val) = std::env::var("FIRECTL_PASSWORD") {
        return Some(SecretString::from(val));
    }
    profile
        .password
        .as_ref()
        .map(|p| SecretString::from(p.clone()))
}

/// Resolve the local signing key; `None` means setup recovers it from the
/// cloud.
pub fn resolve_api_key(profile: &Profile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    profile
        .api_key
        .as_ref()
        .map(|k| SecretString::from(k.clone()))
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a [`FireplaceConfig`] from a profile plus the shared defaults.
pub fn profile_to_fireplace_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<FireplaceConfig, ConfigError> {
    if profile.host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "profile has no fireplace host".into(),
        });
    }

    Ok(FireplaceConfig {
        host: profile.host.clone(),
        username: profile.username.clone(),
        password: resolve_password(profile),
        api_key: resolve_api_key(profile),
        user_id: profile.user_id.clone(),
        serial: profile.serial.clone(),
        read_mode: profile.read_mode,
        control_mode: profile.control_mode,
        refresh_interval: Duration::from_secs(
            profile.refresh_interval.unwrap_or(defaults.refresh_interval),
        ),
        http_timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        init_poll_interval: Duration::from_secs(defaults.init_poll_interval),
        init_timeout: Duration::from_secs(defaults.init_timeout),
        cloud_base: profile.cloud_base.clone(),
        ..FireplaceConfig::default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_profiles_from_toml() {
        let (_dir, path) = write_config(
            r#"
            default_fireplace = "den"

            [defaults]
            refresh_interval = 20

            [fireplace.den]
            host = "10.0.0.5"
            username = "you@example.com"
            password = "hunter2"
            read_mode = "cloud"
            "#,
        );

        let config = load_config_at(&path).unwrap();
        assert_eq!(config.default_fireplace.as_deref(), Some("den"));
        assert_eq!(config.defaults.refresh_interval, 20);

        let (name, profile) = select_profile(&config, None).unwrap();
        assert_eq!(name, "den");
        assert_eq!(profile.host, "10.0.0.5");
        assert_eq!(profile.read_mode, ApiMode::Cloud);
        assert_eq!(profile.control_mode, ApiMode::Local);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_at(&dir.path().join("nope.toml")).unwrap();
        assert!(config.fireplaces.is_empty());
        assert_eq!(config.defaults.refresh_interval, 15);
    }

    #[test]
    fn sole_profile_is_selected_without_a_default() {
        let (_dir, path) = write_config(
            r#"
            [fireplace.only]
            host = "10.0.0.5"
            "#,
        );
        let config = load_config_at(&path).unwrap();
        let (name, _) = select_profile(&config, None).unwrap();
        assert_eq!(name, "only");
    }

    #[test]
    fn selection_errors_are_distinct() {
        let config = Config::default();
        assert!(matches!(
            select_profile(&config, None),
            Err(ConfigError::NoProfiles)
        ));
        assert!(matches!(
            select_profile(&config, Some("nope")),
            Err(ConfigError::UnknownProfile { .. })
        ));

        let (_dir, path) = write_config(
            r#"
            [fireplace.a]
            host = "10.0.0.1"
            [fireplace.b]
            host = "10.0.0.2"
            "#,
        );
        let config = load_config_at(&path).unwrap();
        assert!(matches!(
            select_profile(&config, None),
            Err(ConfigError::AmbiguousProfile)
        ));
    }

    #[test]
    fn profile_translates_to_fireplace_config() {
        let profile = Profile {
            host: "10.0.0.5".to_owned(),
            username: Some("you@example.com".to_owned()),
            password: Some("hunter2".to_owned()),
            api_key: Some("deadbeef".to_owned()),
            user_id: Some("user-1".to_owned()),
            refresh_interval: Some(30),
            ..Profile::default()
        };

        let fc = profile_to_fireplace_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(fc.host, "10.0.0.5");
        assert_eq!(fc.refresh_interval, Duration::from_secs(30));
        assert_eq!(fc.init_timeout, Duration::from_secs(600));
        assert_eq!(fc.password.unwrap().expose_secret(), "hunter2");
        assert_eq!(fc.api_key.unwrap().expose_secret(), "deadbeef");
    }

    #[test]
    fn empty_host_is_rejected() {
        let result = profile_to_fireplace_config(&Profile::default(), &Defaults::default());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn sample_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        save_config_at(&sample_config(), &path).unwrap();

        let config = load_config_at(&path).unwrap();
        let (name, profile) = select_profile(&config, None).unwrap();
        assert_eq!(name, "living-room");
        assert_eq!(profile.password_env.as_deref(), Some("IFT_PASSWORD"));
    }
}
