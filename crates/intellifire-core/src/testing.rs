// Scripted transport double for coordinator and entity tests.
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use intellifire_api::{
    Error, FireplaceCommand, FireplaceController, FireplaceReadSource, PollData,
};

/// In-memory stand-in for a transport.
///
/// Records every lifecycle call into a log shared between the local and
/// cloud doubles, so tests can assert cross-transport ordering (the
/// handover's stop -> copy -> start sequence in particular).
pub(crate) struct MockApi {
    label: &'static str,
    log: Arc<Mutex<Vec<String>>>,
    cache: watch::Sender<PollData>,
    polling: AtomicBool,
    failed: AtomicU32,
    start_calls: AtomicU32,
    poll_calls: AtomicU32,
    fail_polls: AtomicBool,
    poll_data: Mutex<Option<PollData>>,
    commands: Mutex<Vec<FireplaceCommand>>,
}

impl MockApi {
    pub(crate) fn shared_log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub(crate) fn new(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label,
            log,
            cache: watch::Sender::new(PollData::default()),
            polling: AtomicBool::new(false),
            failed: AtomicU32::new(0),
            start_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            fail_polls: AtomicBool::new(false),
            poll_data: Mutex::new(None),
            commands: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, event: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{event}", self.label));
    }

    /// Replace the cached snapshot directly, without logging an event.
    pub(crate) fn set_data(&self, data: PollData) {
        self.cache.send_replace(data);
    }

    /// What the next successful [`poll`](FireplaceReadSource::poll) writes.
    pub(crate) fn set_poll_data(&self, data: PollData) {
        *self.poll_data.lock().unwrap() = Some(data);
    }

    pub(crate) fn fail_polls(&self, fail: bool) {
        self.fail_polls.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_failed_poll_attempts(&self, n: u32) {
        self.failed.store(n, Ordering::SeqCst);
    }

    pub(crate) fn sent_commands(&self) -> Vec<FireplaceCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub(crate) fn event_log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn clear_event_log(&self) {
        self.log.lock().unwrap().clear();
    }

    pub(crate) fn start_calls(&self) -> u32 {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FireplaceReadSource for MockApi {
    async fn poll(&self) -> Result<(), Error> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_polls.load(Ordering::SeqCst) {
            self.failed.fetch_add(1, Ordering::SeqCst);
            return Err(Error::Timeout { timeout_secs: 1 });
        }
        self.failed.store(0, Ordering::SeqCst);
        if let Some(data) = self.poll_data.lock().unwrap().clone() {
            self.cache.send_replace(data);
        }
        Ok(())
    }

    fn data(&self) -> PollData {
        self.cache.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<PollData> {
        self.cache.subscribe()
    }

    fn is_polling_in_background(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }

    async fn start_background_polling(&self) -> bool {
        self.record("start");
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        !self.polling.swap(true, Ordering::SeqCst)
    }

    async fn stop_background_polling(&self) -> bool {
        self.record("stop");
        self.polling.swap(false, Ordering::SeqCst)
    }

    fn overwrite_data(&self, data: PollData) {
        self.record("overwrite");
        self.cache.send_replace(data);
    }

    fn failed_poll_attempts(&self) -> u32 {
        self.failed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FireplaceController for MockApi {
    async fn send_command(&self, command: FireplaceCommand) -> Result<(), Error> {
        command.validate()?;
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}
