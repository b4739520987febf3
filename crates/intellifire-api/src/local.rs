// ── Local LAN transport ──
//
// Talks directly to the fireplace module's embedded HTTP server:
//   GET /poll           -> JSON status document
//   GET /get_challenge  -> hex nonce for command signing
//   POST /post          -> signed command
//
// Command signing: response = sha256(api_key_bytes || challenge_bytes ||
// "post:command=<name>&value=<value>"), hex-encoded. The api_key is the
// per-fireplace hex secret recovered from the cloud enumeration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::api::{FireplaceController, FireplaceReadSource};
use crate::background::{PollTaskSlot, SnapshotCache};
use crate::command::FireplaceCommand;
use crate::error::Error;
use crate::model::PollData;
use crate::transport::TransportConfig;

/// Default interval for the local background polling loop.
pub const DEFAULT_LOCAL_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Client for the module's embedded LAN HTTP interface.
///
/// Cheaply cloneable; the snapshot cache, failure counter, and background
/// poll task are shared across clones.
#[derive(Clone)]
pub struct LocalApi {
    inner: Arc<LocalApiInner>,
}

struct LocalApiInner {
    http: reqwest::Client,
    base: Url,
    host: String,
    api_key: SecretString,
    user_id: String,
    poll_interval: Duration,
    request_timeout: Duration,
    cache: SnapshotCache,
    poll_task: PollTaskSlot,
}

impl LocalApi {
    /// Create a local client for the module at `host` (IP or hostname).
    pub fn new(
        host: &str,
        api_key: SecretString,
        user_id: String,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base = Url::parse(&format!("http://{host}/"))?;
        let http = transport.build_client()?;
        Ok(Self {
            inner: Arc::new(LocalApiInner {
                http,
                base,
                host: host.to_owned(),
                api_key,
                user_id,
                poll_interval: DEFAULT_LOCAL_POLL_INTERVAL,
                request_timeout: transport.timeout,
                cache: SnapshotCache::new(),
                poll_task: PollTaskSlot::new(),
            }),
        })
    }

    /// The host/IP this client polls (used for the management URL).
    pub fn fireplace_host(&self) -> &str {
        &self.inner.host
    }

    async fn fetch_poll(inner: &LocalApiInner) -> Result<PollData, Error> {
        let url = inner.base.join("poll")?;
        debug!("GET {url}");
        let resp = inner.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: inner.request_timeout.as_secs(),
                }
            } else {
                Error::Transport(e)
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::PollHttp {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    async fn fetch_challenge(&self) -> Result<Vec<u8>, Error> {
        let url = self.inner.base.join("get_challenge")?;
        debug!("GET {url}");
        let raw = self
            .inner
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        hex::decode(raw.trim()).map_err(|e| Error::ChallengeFailed {
            message: format!("challenge is not valid hex: {e}"),
        })
    }

    fn sign_payload(&self, challenge: &[u8], payload: &str) -> Result<String, Error> {
        let api_key =
            hex::decode(self.inner.api_key.expose_secret()).map_err(|e| Error::InvalidApiKey {
                message: format!("api key is not valid hex: {e}"),
            })?;
        let mut hasher = Sha256::new();
        hasher.update(&api_key);
        hasher.update(challenge);
        hasher.update(payload.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Background loop: one poll per interval until cancelled.
///
/// The first interval tick fires immediately, so the cache fills without
/// waiting a full period after start.
async fn local_poll_task(inner: Arc<LocalApiInner>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(inner.poll_interval);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match LocalApi::fetch_poll(&inner).await {
                    Ok(data) => inner.cache.record_success(data),
                    Err(e) => {
                        let failures = inner.cache.record_failure();
                        warn!(error = %e, failures, "local poll failed");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl FireplaceReadSource for LocalApi {
    async fn poll(&self) -> Result<(), Error> {
        match Self::fetch_poll(&self.inner).await {
            Ok(data) => {
                self.inner.cache.record_success(data);
                Ok(())
            }
            Err(e) => {
                self.inner.cache.record_failure();
                Err(e)
            }
        }
    }

    fn data(&self) -> PollData {
        self.inner.cache.data()
    }

    fn subscribe(&self) -> watch::Receiver<PollData> {
        self.inner.cache.subscribe()
    }

    fn is_polling_in_background(&self) -> bool {
        self.inner.poll_task.is_active()
    }

    async fn start_background_polling(&self) -> bool {
        let inner = Arc::clone(&self.inner);
        let started = self
            .inner
            .poll_task
            .start(|cancel| tokio::spawn(local_poll_task(inner, cancel)))
            .await;
        if started {
            debug!(host = %self.inner.host, "local background polling started");
        }
        started
    }

    async fn stop_background_polling(&self) -> bool {
        let stopped = self.inner.poll_task.stop().await;
        if stopped {
            debug!(host = %self.inner.host, "local background polling stopped");
        }
        stopped
    }

    fn overwrite_data(&self, data: PollData) {
        self.inner.cache.overwrite(data);
    }

    fn failed_poll_attempts(&self) -> u32 {
        self.inner.cache.failed_polls()
    }
}

#[async_trait]
impl FireplaceController for LocalApi {
    async fn send_command(&self, command: FireplaceCommand) -> Result<(), Error> {
        command.validate()?;
        let name = command.wire_name();
        let value = command.wire_value();

        let challenge = self.fetch_challenge().await?;
        let payload = format!("post:command={name}&value={value}");
        let response = self.sign_payload(&challenge, &payload)?;

        let url = self.inner.base.join("post")?;
        debug!(command = name, value, "POST {url}");
        let resp = self
            .inner
            .http
            .post(url)
            .form(&[
                ("command", name),
                ("value", &value.to_string()),
                ("user", &self.inner.user_id),
                ("response", &response),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::CommandRejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
