// ── Setup flow ──
//
// Turns a `FireplaceConfig` into a running `Coordinator`: cloud login,
// recovery of the local signing material when it is not stored, the wait
// for the module to report a real identity, and the first refresh.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use intellifire_api::{
    CloudApi, DEFAULT_CLOUD_BASE, FireplaceApi, FireplaceReadSource, LocalApi, TransportConfig,
};

use crate::config::{ApiMode, FireplaceConfig};
use crate::coordinator::Coordinator;
use crate::error::CoreError;

/// Local signing material recovered from the cloud during setup.
///
/// Callers should persist these so later setups work without a cloud
/// round-trip (and keep working when the relay is down).
#[derive(Clone)]
pub struct RecoveredCredentials {
    pub api_key: SecretString,
    pub user_id: String,
    pub serial: String,
}

/// Result of a successful [`connect`].
pub struct Connected {
    /// Running coordinator; its scheduled refresh task is already started.
    pub coordinator: Coordinator,
    /// Set when setup had to recover credentials from the cloud.
    pub recovered: Option<RecoveredCredentials>,
    /// Non-fatal conditions worth surfacing (degraded cloud, mostly).
    pub warnings: Vec<String>,
}

/// Connect to a fireplace and start coordinating it.
///
/// Error meaning:
/// - [`CoreError::AuthRequired`]: credentials missing or rejected; do not
///   retry until the user re-enters them.
/// - [`CoreError::NotReady`]: the fireplace or relay is unreachable right
///   now; retry the whole setup later.
///
/// When both modes are local and signing material is stored, a cloud
/// *connectivity* failure degrades to a warning instead of failing setup;
/// a cloud credential *rejection* always fails.
pub async fn connect(config: &FireplaceConfig) -> Result<Connected, CoreError> {
    let transport = TransportConfig::default().with_timeout(config.http_timeout);

    let cloud_base = config.cloud_base.as_deref().unwrap_or(DEFAULT_CLOUD_BASE);
    let cloud = CloudApi::with_base(cloud_base, config.serial.clone(), &transport)
        .map_err(|e| CoreError::Config {
            message: format!("cloud client: {e}"),
        })?;

    let username = config
        .username
        .clone()
        .ok_or_else(|| CoreError::auth_required("no cloud username configured"))?;
    let password = config
        .password
        .clone()
        .ok_or_else(|| CoreError::auth_required("no cloud password configured"))?;

    let local_only =
        config.read_mode == ApiMode::Local && config.control_mode == ApiMode::Local;
    let has_signing_material = config.api_key.is_some() && config.user_id.is_some();

    let mut warnings = Vec::new();
    match cloud.login(&username, &password).await {
        Ok(()) => {}
        Err(e) if e.is_auth_error() => {
            return Err(CoreError::auth_required(format!("cloud login rejected: {e}")));
        }
        Err(e) if local_only && has_signing_material => {
            warn!(error = %e, "cloud unreachable, continuing local-only with stored credentials");
            warnings.push(format!(
                "cloud login failed ({e}); running local-only with stored credentials"
            ));
        }
        Err(e) => {
            return Err(CoreError::not_ready(format!("cloud unreachable: {e}")));
        }
    }

    // Stored signing material wins; otherwise recover it from the session
    // the login just established.
    let (api_key, user_id, recovered) = match (config.api_key.clone(), config.user_id.clone()) {
        (Some(api_key), Some(user_id)) => (api_key, user_id, None),
        _ => {
            info!("recovering api key and user id from the cloud account");
            let auth = |e: intellifire_api::Error| CoreError::auth_required(e.to_string());
            let api_key = cloud.api_key().map_err(auth)?;
            let user_id = cloud.user_id().map_err(auth)?;
            let serial = cloud.serial().map_err(auth)?;
            (
                api_key.clone(),
                user_id.clone(),
                Some(RecoveredCredentials {
                    api_key,
                    user_id,
                    serial,
                }),
            )
        }
    };

    let local = LocalApi::new(&config.host, api_key, user_id, &transport).map_err(|e| {
        CoreError::Config {
            message: format!("local client: {e}"),
        }
    })?;

    wait_for_identity(&local, config.init_poll_interval, config.init_timeout).await?;

    let coordinator = Coordinator::new(Arc::new(local), Arc::new(cloud), config);

    // The first refresh gates setup: a failure here means "retry setup
    // later", not one stale cycle.
    if let Err(e) = coordinator.refresh().await {
        return Err(CoreError::not_ready(format!("initial refresh failed: {e}")));
    }
    coordinator.start().await;

    Ok(Connected {
        coordinator,
        recovered,
        warnings,
    })
}

/// Poll the module until it stops reporting placeholder identity.
///
/// A freshly booted module answers polls with serial `unset` and a
/// link-local address for a while; publishing that would corrupt anything
/// keyed on the serial. Bounded by `bound`, polling every `interval`.
async fn wait_for_identity(
    local: &dyn FireplaceApi,
    interval: Duration,
    bound: Duration,
) -> Result<(), CoreError> {
    let wait = async {
        loop {
            match local.poll().await {
                Ok(()) => {
                    let data = local.data();
                    if data.has_identity() {
                        debug!(serial = %data.serial, ip = %data.ipv4_address, "fireplace identity resolved");
                        return;
                    }
                    debug!("fireplace still reports placeholder identity");
                }
                Err(e) => debug!(error = %e, "identity poll failed, retrying"),
            }
            tokio::time::sleep(interval).await;
        }
    };
    tokio::time::timeout(bound, wait).await.map_err(|_| {
        CoreError::not_ready(format!(
            "fireplace did not report a real identity within {}s",
            bound.as_secs()
        ))
    })
}
