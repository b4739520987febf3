// ── Cloud relay transport ──
//
// Talks to the vendor relay at iftapi.net. Authentication is a cookie
// session established by POST /a/login; the session's `user` cookie doubles
// as the user id the local transport signs commands with. Location and
// fireplace enumeration recover the per-fireplace serial and api key.
//
//   POST /a/login                         -> 204 + session cookies
//   GET  /a/enumlocations                 -> { locations: [...] }
//   GET  /a/enumfireplaces?location_id=X  -> { fireplaces: [...] }
//   GET  /a/{serial}//apppoll             -> JSON status document
//   GET  /a/{serial}//applongpoll         -> blocks until status changes
//   POST /a/{serial}//apppost             -> command

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
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

/// Production cloud relay base.
pub const DEFAULT_CLOUD_BASE: &str = "https://iftapi.net/a/";

/// Interval between poll attempts when the long-poll path errors out.
pub const DEFAULT_CLOUD_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// The relay holds a long-poll open for about a minute.
const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(70);

/// Session material recovered at login.
#[derive(Clone)]
struct CloudSession {
    user_id: String,
    serial: String,
    api_key: SecretString,
}

/// A fireplace as returned by the cloud enumeration.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudFireplace {
    pub serial: String,
    pub apikey: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct LocationsResponse {
    locations: Vec<Location>,
}

#[derive(Deserialize)]
struct Location {
    location_id: String,
}

#[derive(Deserialize)]
struct FireplacesResponse {
    fireplaces: Vec<CloudFireplace>,
}

/// Client for the vendor cloud relay.
///
/// Cheaply cloneable; session, snapshot cache, and the background poll
/// task are shared across clones. [`login`](Self::login) must succeed
/// before polls or commands are possible.
#[derive(Clone)]
pub struct CloudApi {
    inner: Arc<CloudApiInner>,
}

struct CloudApiInner {
    http: reqwest::Client,
    base: Url,
    poll_interval: Duration,
    session: RwLock<Option<CloudSession>>,
    /// Serial to select among the account's fireplaces (first one if unset).
    preferred_serial: Option<String>,
    cache: SnapshotCache,
    poll_task: PollTaskSlot,
}

impl CloudApi {
    /// Create a cloud client against the production relay.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Self::with_base(DEFAULT_CLOUD_BASE, None, transport)
    }

    /// Create a cloud client with an explicit base URL and an optional
    /// preferred serial (for accounts with several fireplaces).
    pub fn with_base(
        base: &str,
        preferred_serial: Option<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        // Session auth needs a cookie jar.
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self {
            inner: Arc::new(CloudApiInner {
                http,
                base: Url::parse(base)?,
                poll_interval: DEFAULT_CLOUD_POLL_INTERVAL,
                session: RwLock::new(None),
                preferred_serial,
                cache: SnapshotCache::new(),
                poll_task: PollTaskSlot::new(),
            }),
        })
    }

    /// Log in and enumerate the account's fireplaces.
    ///
    /// On success the session carries the user id, the selected fireplace's
    /// serial, and its api key -- exactly the material the local transport
    /// needs for signed commands.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.inner.base.join("login")?;
        debug!("POST {url}");
        let resp = self
            .inner
            .http
            .post(url)
            .form(&[("username", username), ("password", password.expose_secret())])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "cloud rejected the credentials".into(),
            });
        }
        if !status.is_success() {
            return Err(Error::CloudApi {
                status: status.as_u16(),
                message: "login failed".into(),
            });
        }

        let user_id = resp
            .cookies()
            .find(|c| c.name() == "user")
            .map(|c| c.value().to_owned())
            .ok_or_else(|| Error::Authentication {
                message: "login response carried no user cookie".into(),
            })?;

        let fireplace = self.enumerate_fireplace().await?;
        debug!(serial = %fireplace.serial, "cloud session established");

        let session = CloudSession {
            user_id,
            serial: fireplace.serial,
            api_key: SecretString::from(fireplace.apikey),
        };
        *self.inner
            .session
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(session);
        Ok(())
    }

    /// Walk locations until a fireplace matches the preferred serial
    /// (or take the first one found).
    async fn enumerate_fireplace(&self) -> Result<CloudFireplace, Error> {
        let locations: LocationsResponse = self.get_json(self.inner.base.join("enumlocations")?).await?;

        let mut first: Option<CloudFireplace> = None;
        for location in locations.locations {
            let mut url = self.inner.base.join("enumfireplaces")?;
            url.query_pairs_mut()
                .append_pair("location_id", &location.location_id);
            let listing: FireplacesResponse = self.get_json(url).await?;

            for fireplace in listing.fireplaces {
                if let Some(ref wanted) = self.inner.preferred_serial {
                    if &fireplace.serial == wanted {
                        return Ok(fireplace);
                    }
                }
                if first.is_none() {
                    first = Some(fireplace);
                }
            }
        }
        first.ok_or(Error::NoFireplaces)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");
        let resp = self.inner.http.get(url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::SessionExpired);
        }
        if !status.is_success() {
            return Err(Error::CloudApi {
                status: status.as_u16(),
                message: "cloud request failed".into(),
            });
        }
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    fn session(&self) -> Result<CloudSession, Error> {
        self.inner
            .session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotLoggedIn)
    }

    /// Whether a login has completed.
    pub fn is_logged_in(&self) -> bool {
        self.inner
            .session
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_some()
    }

    /// The session user id (also used by the local transport).
    pub fn user_id(&self) -> Result<String, Error> {
        Ok(self.session()?.user_id)
    }

    /// The selected fireplace's serial.
    pub fn serial(&self) -> Result<String, Error> {
        Ok(self.session()?.serial)
    }

    /// The selected fireplace's api key (local command signing secret).
    pub fn api_key(&self) -> Result<SecretString, Error> {
        Ok(self.session()?.api_key)
    }

    fn fireplace_url(&self, endpoint: &str) -> Result<Url, Error> {
        let serial = self.session()?.serial;
        // The relay's paths really do carry a double slash after the serial.
        Ok(Url::parse(&format!(
            "{}{serial}//{endpoint}",
            self.inner.base
        ))?)
    }

    async fn fetch_poll(&self) -> Result<PollData, Error> {
        self.get_json(self.fireplace_url("apppoll")?).await
    }

    /// Long-poll for a status change. `Ok(None)` means the relay timed out
    /// without a change and the caller should re-issue.
    async fn long_poll(&self) -> Result<Option<PollData>, Error> {
        let url = self.fireplace_url("applongpoll")?;
        debug!("GET {url} (long poll)");
        let resp = self
            .inner
            .http
            .get(url)
            .timeout(LONG_POLL_TIMEOUT)
            .send()
            .await?;

        match resp.status() {
            reqwest::StatusCode::REQUEST_TIMEOUT | reqwest::StatusCode::NO_CONTENT => Ok(None),
            reqwest::StatusCode::FORBIDDEN => Err(Error::SessionExpired),
            status if status.is_success() => {
                let body = resp.text().await?;
                let data = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body,
                })?;
                Ok(Some(data))
            }
            status => Err(Error::CloudApi {
                status: status.as_u16(),
                message: "long poll failed".into(),
            }),
        }
    }
}

/// Background loop: long-poll for changes. When the long-poll path errors,
/// fall back to one plain `apppoll`, then sleep a fixed interval so a dead
/// relay doesn't spin the task.
async fn cloud_poll_task(api: CloudApi, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = api.long_poll() => {
                match result {
                    Ok(Some(data)) => api.inner.cache.record_success(data),
                    Ok(None) => {} // relay timeout, re-issue immediately
                    Err(e) => {
                        match api.fetch_poll().await {
                            Ok(data) => {
                                debug!(error = %e, "long poll failed, plain poll recovered");
                                api.inner.cache.record_success(data);
                            }
                            Err(fallback) => {
                                let failures = api.inner.cache.record_failure();
                                warn!(
                                    long_poll_error = %e,
                                    error = %fallback,
                                    failures,
                                    "cloud poll failed"
                                );
                            }
                        }
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(api.inner.poll_interval) => {}
                        }
                    }
                }
            }
        }
    }
}

#[async_trait]
impl FireplaceReadSource for CloudApi {
    async fn poll(&self) -> Result<(), Error> {
        match self.fetch_poll().await {
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
        let api = self.clone();
        let started = self
            .inner
            .poll_task
            .start(|cancel| tokio::spawn(cloud_poll_task(api, cancel)))
            .await;
        if started {
            debug!("cloud background polling started");
        }
        started
    }

    async fn stop_background_polling(&self) -> bool {
        let stopped = self.inner.poll_task.stop().await;
        if stopped {
            debug!("cloud background polling stopped");
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
impl FireplaceController for CloudApi {
    async fn send_command(&self, command: FireplaceCommand) -> Result<(), Error> {
        command.validate()?;
        let name = command.wire_name();
        let value = command.wire_value();

        let url = self.fireplace_url("apppost")?;
        debug!(command = name, value, "POST {url}");
        let resp = self
            .inner
            .http
            .post(url)
            .form(&[(name, value.to_string())])
            .send()
            .await?;

        match resp.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::FORBIDDEN => Err(Error::SessionExpired),
            status => Err(Error::CommandRejected {
                status: status.as_u16(),
            }),
        }
    }
}
