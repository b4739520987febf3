// ── Shared background-polling state ──
//
// Both transports own the same snapshot-cache / failure-counter / poll-task
// shape; this module holds it once. The poll task itself is spawned by the
// owning client (local and cloud loops differ), but start/stop ownership
// and the "never start twice" invariant live here.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::model::PollData;

/// Cached snapshot plus the consecutive-failure counter.
pub(crate) struct SnapshotCache {
    data: watch::Sender<PollData>,
    failed_polls: AtomicU32,
}

impl SnapshotCache {
    pub(crate) fn new() -> Self {
        let (data, _) = watch::channel(PollData::default());
        Self {
            data,
            failed_polls: AtomicU32::new(0),
        }
    }

    pub(crate) fn data(&self) -> PollData {
        self.data.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<PollData> {
        self.data.subscribe()
    }

    /// Replace the snapshot without touching the failure counter
    /// (mode-handover seeding).
    pub(crate) fn overwrite(&self, data: PollData) {
        self.data.send_replace(data);
    }

    /// A poll succeeded: store the snapshot and reset the counter.
    pub(crate) fn record_success(&self, data: PollData) {
        self.failed_polls.store(0, Ordering::Relaxed);
        self.data.send_replace(data);
    }

    /// A poll failed: bump the counter and return the new total.
    pub(crate) fn record_failure(&self) -> u32 {
        self.failed_polls.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn failed_polls(&self) -> u32 {
        self.failed_polls.load(Ordering::Relaxed)
    }
}

struct PollTask {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Slot holding at most one running poll task per transport.
pub(crate) struct PollTaskSlot {
    task: Mutex<Option<PollTask>>,
    active: AtomicBool,
}

impl PollTaskSlot {
    pub(crate) fn new() -> Self {
        Self {
            task: Mutex::new(None),
            active: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawn the task unless one is already running.
    ///
    /// The closure receives the cancellation token the loop must select on.
    pub(crate) async fn start<F>(&self, spawn: F) -> bool
    where
        F: FnOnce(CancellationToken) -> JoinHandle<()>,
    {
        let mut slot = self.task.lock().await;
        if slot.is_some() {
            return false;
        }
        let cancel = CancellationToken::new();
        let handle = spawn(cancel.clone());
        *slot = Some(PollTask { handle, cancel });
        self.active.store(true, Ordering::SeqCst);
        true
    }

    /// Cancel the task and wait for it to exit.
    pub(crate) async fn stop(&self) -> bool {
        let task = self.task.lock().await.take();
        let Some(task) = task else {
            return false;
        };
        task.cancel.cancel();
        let _ = task.handle.await;
        self.active.store(false, Ordering::SeqCst);
        true
    }
}
