// ── Dual-mode update coordinator ──
//
// The coordinator owns both transports and arbitrates between them. Read
// mode and control mode are independent flags; each operation asks for the
// transport its flag currently points at. Mode changes for control go
// through a stop -> copy -> start handover so the incoming transport never
// serves stale or empty data.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use intellifire_api::{FireplaceApi, FireplaceReadSource, PollData};

use crate::config::{ApiMode, FireplaceConfig};
use crate::error::CoreError;

/// Consecutive local poll failures tolerated before a refresh is failed
/// outright, regardless of which transport serves reads.
pub const MAX_LOCAL_POLL_FAILURES: u32 = 10;

/// Static and per-poll identity of the fireplace, for display surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub name: String,
    pub serial: String,
    pub sw_version: String,
    pub configuration_url: String,
}

/// Arbitrates status reads and command writes across the two transports.
///
/// Cheaply cloneable; all clones share the mode flags, the published
/// snapshot, and the scheduled refresh task.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    local: Arc<dyn FireplaceApi>,
    cloud: Arc<dyn FireplaceApi>,
    /// LAN host, kept for the configuration URL.
    local_host: String,
    read_mode: watch::Sender<ApiMode>,
    control_mode: watch::Sender<ApiMode>,
    /// Last snapshot a successful refresh published.
    snapshot: watch::Sender<PollData>,
    /// Serializes mode changes so two concurrent handovers cannot
    /// interleave their stop/copy/start sequences.
    handover: Mutex<()>,
    refresh_interval: Duration,
    local_poll_timeout: Duration,
    refresh_now: Notify,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Build a coordinator over an already-connected pair of transports.
    ///
    /// [`setup::connect`](crate::setup::connect) is the usual entry point;
    /// constructing directly is for callers that manage their own login.
    pub fn new(
        local: Arc<dyn FireplaceApi>,
        cloud: Arc<dyn FireplaceApi>,
        config: &FireplaceConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                local,
                cloud,
                local_host: config.host.clone(),
                read_mode: watch::Sender::new(config.read_mode),
                control_mode: watch::Sender::new(config.control_mode),
                snapshot: watch::Sender::new(PollData::default()),
                handover: Mutex::new(()),
                refresh_interval: config.refresh_interval,
                local_poll_timeout: config.local_poll_timeout,
                refresh_now: Notify::new(),
                cancel: CancellationToken::new(),
                task: Mutex::new(None),
            }),
        }
    }

    // ── Mode arbitration ────────────────────────────────────────────

    pub fn read_mode(&self) -> ApiMode {
        *self.inner.read_mode.borrow()
    }

    pub fn control_mode(&self) -> ApiMode {
        *self.inner.control_mode.borrow()
    }

    /// Subscribe to read-mode changes.
    pub fn subscribe_read_mode(&self) -> watch::Receiver<ApiMode> {
        self.inner.read_mode.subscribe()
    }

    /// Subscribe to control-mode changes.
    pub fn subscribe_control_mode(&self) -> watch::Receiver<ApiMode> {
        self.inner.control_mode.subscribe()
    }

    fn api_for(&self, mode: ApiMode) -> &Arc<dyn FireplaceApi> {
        match mode {
            ApiMode::Local => &self.inner.local,
            ApiMode::Cloud => &self.inner.cloud,
        }
    }

    /// The transport currently serving status reads.
    pub fn read_api(&self) -> Arc<dyn FireplaceApi> {
        Arc::clone(self.api_for(self.read_mode()))
    }

    /// The transport currently serving commands.
    pub fn control_api(&self) -> Arc<dyn FireplaceApi> {
        Arc::clone(self.api_for(self.control_mode()))
    }

    /// Point status reads at the given transport.
    ///
    /// Takes effect on the next refresh; the newly selected transport's
    /// background polling is started lazily there.
    pub async fn set_read_mode(&self, mode: ApiMode) {
        let _guard = self.inner.handover.lock().await;
        let current = *self.inner.read_mode.borrow();
        debug!(from = %current, to = %mode, "changing read mode");
        if current == mode {
            info!(%mode, "read mode unchanged, nothing to do");
            return;
        }
        self.inner.read_mode.send_replace(mode);
        self.request_refresh();
    }

    /// Point commands at the given transport, handing over polling state.
    ///
    /// The outgoing transport's background task is stopped and awaited
    /// first, then its snapshot is copied into the incoming transport,
    /// then the incoming transport's task is started. The old task must be
    /// fully gone before the copy or it could overwrite the seeded data.
    pub async fn set_control_mode(&self, mode: ApiMode) {
        let _guard = self.inner.handover.lock().await;
        let current = *self.inner.control_mode.borrow();
        debug!(from = %current, to = %mode, "changing control mode");
        if current == mode {
            info!(%mode, "control mode unchanged, nothing to do");
            return;
        }

        let from_api = self.api_for(current);
        let to_api = self.api_for(mode);

        from_api.stop_background_polling().await;
        to_api.overwrite_data(from_api.data());
        to_api.start_background_polling().await;

        self.inner.control_mode.send_replace(mode);
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Run one refresh cycle and publish the resulting snapshot.
    ///
    /// If the read transport's background polling is not running it is
    /// started here; in local mode one poll is additionally forced (and
    /// bounded) so the first refresh never publishes placeholder data.
    pub async fn refresh(&self) -> Result<PollData, CoreError> {
        let mode = self.read_mode();
        debug!(%mode, "refreshing fireplace state");
        let read_api = self.read_api();

        if !read_api.is_polling_in_background() {
            info!(%mode, "read transport idle, starting background polling");
            read_api.start_background_polling().await;

            if mode == ApiMode::Local {
                // A fresh local transport serves placeholder data until its
                // first poll lands; force one now rather than publish it.
                let forced = tokio::time::timeout(self.inner.local_poll_timeout, read_api.poll());
                match forced.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        return Err(CoreError::update_failed(format!(
                            "local fireplace poll failed: {e}"
                        )));
                    }
                    Err(_) => {
                        return Err(CoreError::update_failed(format!(
                            "local fireplace poll timed out after {}s",
                            self.inner.local_poll_timeout.as_secs()
                        )));
                    }
                }
            }
        }

        // Cross-check the LAN transport even when reads come from the
        // cloud: a module that keeps refusing local polls is in a state
        // where neither side's data can be trusted.
        let local_failures = self.inner.local.failed_poll_attempts();
        if local_failures > MAX_LOCAL_POLL_FAILURES {
            debug!(local_failures, "too many local poll errors, failing refresh");
            return Err(CoreError::update_failed(format!(
                "local polling has failed {local_failures} times in a row"
            )));
        }

        let data = read_api.data();
        self.inner.snapshot.send_replace(data.clone());
        Ok(data)
    }

    /// The snapshot published by the most recent successful refresh.
    pub fn snapshot(&self) -> PollData {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<PollData> {
        self.inner.snapshot.subscribe()
    }

    /// Ask the scheduled refresh task to run a cycle now.
    ///
    /// Fire-and-forget; used after commands so state catches up without
    /// waiting out the refresh interval. A no-op when the task is not
    /// running.
    pub fn request_refresh(&self) {
        self.inner.refresh_now.notify_one();
    }

    /// Device identity assembled from the current read snapshot.
    pub fn device_info(&self) -> DeviceInfo {
        let data = self.read_api().data();
        DeviceInfo {
            manufacturer: "Hearth and Home",
            model: "IFT-WFM",
            name: if data.name.is_empty() {
                "IntelliFire".to_owned()
            } else {
                data.name.clone()
            },
            serial: data.serial,
            sw_version: data.fw_ver_str,
            configuration_url: format!("http://{}/poll", self.inner.local_host),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Spawn the scheduled refresh task. Idempotent.
    pub async fn start(&self) {
        let mut task = self.inner.task.lock().await;
        if task.is_some() {
            return;
        }
        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        *task = Some(tokio::spawn(refresh_task(coordinator, cancel)));
        debug!(
            interval_secs = self.inner.refresh_interval.as_secs(),
            "scheduled refresh task started"
        );
    }

    /// Stop the refresh task and both transports' background polling.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "refresh task did not exit cleanly");
            }
        }
        self.inner.local.stop_background_polling().await;
        self.inner.cloud.stop_background_polling().await;
        info!("coordinator shut down");
    }

    async fn run_scheduled_refresh(&self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "scheduled refresh failed");
        }
    }
}

/// Periodic refresh loop. Out-of-band requests reset the interval so a
/// command-triggered refresh is not immediately followed by a scheduled
/// one.
async fn refresh_task(coordinator: Coordinator, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(coordinator.inner.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first interval tick fires immediately, but setup already ran a
    // refresh; skip it.
    ticker.tick().await;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = coordinator.inner.refresh_now.notified() => {
                ticker.reset();
                coordinator.run_scheduled_refresh().await;
            }
            _ = ticker.tick() => coordinator.run_scheduled_refresh().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::MockApi;
    use intellifire_api::FireplaceController;
    use pretty_assertions::assert_eq;

    fn config(read: ApiMode, control: ApiMode) -> FireplaceConfig {
        FireplaceConfig {
            read_mode: read,
            control_mode: control,
            local_poll_timeout: Duration::from_millis(200),
            ..FireplaceConfig::default()
        }
    }

    fn pair() -> (Arc<MockApi>, Arc<MockApi>) {
        let log = MockApi::shared_log();
        (
            Arc::new(MockApi::new("local", Arc::clone(&log))),
            Arc::new(MockApi::new("cloud", log)),
        )
    }

    fn coordinator(
        local: &Arc<MockApi>,
        cloud: &Arc<MockApi>,
        read: ApiMode,
        control: ApiMode,
    ) -> Coordinator {
        Coordinator::new(
            Arc::clone(local) as Arc<dyn FireplaceApi>,
            Arc::clone(cloud) as Arc<dyn FireplaceApi>,
            &config(read, control),
        )
    }

    #[tokio::test]
    async fn selectors_follow_their_mode_flags() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Cloud);

        assert_eq!(c.read_mode(), ApiMode::Local);
        assert_eq!(c.control_mode(), ApiMode::Cloud);

        // Commands go to the cloud mock, reads come from the local one.
        c.control_api().flame_on().await.unwrap();
        assert_eq!(cloud.sent_commands().len(), 1);
        assert!(local.sent_commands().is_empty());

        local.set_data(PollData {
            serial: "LOCAL-SERIAL".into(),
            ..PollData::default()
        });
        assert_eq!(c.read_api().data().serial, "LOCAL-SERIAL");
    }

    #[tokio::test]
    async fn set_control_mode_to_current_mode_is_a_no_op() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        c.set_control_mode(ApiMode::Local).await;

        assert!(local.event_log().is_empty());
        assert!(cloud.event_log().is_empty());
        assert_eq!(c.control_mode(), ApiMode::Local);
    }

    #[tokio::test]
    async fn control_handover_stops_copies_then_starts() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        local.start_background_polling().await;
        local.set_data(PollData {
            serial: "HANDED-OVER".into(),
            power: 1,
            ..PollData::default()
        });
        local.clear_event_log();

        c.set_control_mode(ApiMode::Cloud).await;

        assert_eq!(
            local.event_log(),
            vec!["local:stop", "cloud:overwrite", "cloud:start"],
            "handover must stop the old task before seeding the new one"
        );
        assert_eq!(cloud.data().serial, "HANDED-OVER");
        assert!(cloud.data().is_on());
        assert!(!local.is_polling_in_background());
        assert!(cloud.is_polling_in_background());
        assert_eq!(c.control_mode(), ApiMode::Cloud);
    }

    #[tokio::test]
    async fn set_read_mode_flips_flag_without_touching_tasks() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        c.set_read_mode(ApiMode::Cloud).await;

        assert_eq!(c.read_mode(), ApiMode::Cloud);
        // No handover for reads; the next refresh starts polling lazily.
        assert!(local.event_log().is_empty());
        assert!(cloud.event_log().is_empty());
    }

    #[tokio::test]
    async fn refresh_publishes_the_read_snapshot() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        local.set_poll_data(PollData {
            serial: "FRESH".into(),
            temperature: 21,
            ..PollData::default()
        });

        let data = c.refresh().await.unwrap();
        assert_eq!(data.serial, "FRESH");
        assert_eq!(c.snapshot().serial, "FRESH");
    }

    #[tokio::test]
    async fn refresh_starts_background_polling_only_once() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        c.refresh().await.unwrap();
        c.refresh().await.unwrap();

        assert_eq!(local.start_calls(), 1);
        // The forced poll only happens on the starting refresh.
        assert_eq!(local.poll_calls(), 1);
    }

    #[tokio::test]
    async fn refresh_in_cloud_mode_never_forces_a_poll() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Cloud, ApiMode::Cloud);

        c.refresh().await.unwrap();

        assert_eq!(cloud.start_calls(), 1);
        assert_eq!(cloud.poll_calls(), 0, "cloud long-poll fills the cache itself");
    }

    #[tokio::test]
    async fn refresh_fails_when_the_forced_local_poll_fails() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        local.fail_polls(true);

        let result = c.refresh().await;
        assert!(
            matches!(result, Err(CoreError::UpdateFailed { .. })),
            "expected UpdateFailed, got: {result:?}"
        );
        // Nothing stale or placeholder was published.
        assert!(!c.snapshot().has_identity());
    }

    #[tokio::test]
    async fn refresh_fails_after_excessive_local_failures_even_in_cloud_mode() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Cloud, ApiMode::Cloud);

        cloud.set_data(PollData {
            serial: "CLOUD-DATA".into(),
            ..PollData::default()
        });

        local.set_failed_poll_attempts(MAX_LOCAL_POLL_FAILURES);
        assert!(c.refresh().await.is_ok(), "at the threshold is still fine");

        local.set_failed_poll_attempts(MAX_LOCAL_POLL_FAILURES + 1);
        let result = c.refresh().await;
        assert!(
            matches!(result, Err(CoreError::UpdateFailed { .. })),
            "expected UpdateFailed, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn device_info_reads_the_active_snapshot() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        local.set_data(PollData {
            serial: "ABC123".into(),
            name: "Living room".into(),
            fw_ver_str: "1.3.0.0".into(),
            ..PollData::default()
        });

        let info = c.device_info();
        assert_eq!(info.manufacturer, "Hearth and Home");
        assert_eq!(info.model, "IFT-WFM");
        assert_eq!(info.name, "Living room");
        assert_eq!(info.serial, "ABC123");
        assert_eq!(info.sw_version, "1.3.0.0");
        assert_eq!(info.configuration_url, "http://192.168.1.80/poll");
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_task_refreshes_on_interval_and_on_request() {
        let (local, cloud) = pair();
        let c = coordinator(&local, &cloud, ApiMode::Local, ApiMode::Local);

        local.set_poll_data(PollData {
            serial: "SCHEDULED".into(),
            ..PollData::default()
        });

        let mut rx = c.subscribe();
        c.start().await;
        c.start().await; // idempotent

        // Out-of-band request runs a cycle without waiting out the interval.
        c.request_refresh();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().serial, "SCHEDULED");

        // The interval keeps publishing on its own (paused time auto-advances).
        local.set_data(PollData {
            serial: "TICKED".into(),
            ..PollData::default()
        });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().serial, "TICKED");

        c.shutdown().await;
        assert!(!local.is_polling_in_background());
    }
}
