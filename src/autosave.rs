//! Debounced background saving
//!
//! The store hands every changed form to an [`AutoSaver`]. A background task
//! waits until no new change has arrived for the debounce period, and never
//! saves sooner than the minimum interval after its previous save. Dropping
//! the saver aborts the task, discarding any save still pending.
//!
//! Manual and automatic saves share a [`SaveGate`], so only one write reaches
//! storage at a time and a snapshot older than the last saved one is dropped.

use crate::error::StorageError;
use crate::state::{FormData, StoreEvent};
use crate::storage::FormStorage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(2000);

/// Auto-save timing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveSettings {
    /// Quiet period after the last change before saving
    pub debounce: Duration,
    /// Minimum spacing between two consecutive saves
    pub min_interval: Duration,
}

impl Default for AutoSaveSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }
}

/// Serialises writes to storage and tracks the newest revision written
#[derive(Debug, Clone, Default)]
pub struct SaveGate {
    lock: Arc<Mutex<()>>,
    saved_revision: Arc<AtomicU64>,
}

impl SaveGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision of the newest form that reached storage
    pub fn saved_revision(&self) -> u64 {
        self.saved_revision.load(Ordering::SeqCst)
    }

    /// Write `form` unless a newer revision has already been saved.
    ///
    /// Returns whether the form was written.
    pub async fn save(
        &self,
        storage: &dyn FormStorage,
        revision: u64,
        form: &FormData,
    ) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;
        if revision < self.saved_revision() {
            tracing::debug!("Skipping stale save of revision {revision}");
            return Ok(false);
        }
        storage.persist(form).await?;
        self.saved_revision.fetch_max(revision, Ordering::SeqCst);
        Ok(true)
    }

    /// Hold off every save until the guard is dropped
    pub async fn hold(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Record `revision` as matching storage without writing.
    ///
    /// Only call while holding [`SaveGate::hold`].
    pub fn mark_saved(&self, revision: u64) {
        self.saved_revision.store(revision, Ordering::SeqCst);
    }
}

enum Command {
    Schedule { revision: u64, form: FormData },
    Cancel,
}

/// Handle to the background auto-save task
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

impl AutoSaver {
    /// Spawn the task on `runtime`.
    ///
    /// Saves go through `gate`, which the owner shares for its own saves and
    /// reads to tell whether its current state has reached storage.
    pub fn spawn(
        runtime: &Handle,
        storage: Arc<dyn FormStorage>,
        settings: AutoSaveSettings,
        gate: SaveGate,
        events: broadcast::Sender<StoreEvent>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = runtime.spawn(run(rx, storage, settings, gate, events));
        Self { tx, handle }
    }

    /// Queue `form` for saving, restarting the debounce window
    pub fn schedule(&self, revision: u64, form: FormData) {
        if self.tx.send(Command::Schedule { revision, form }).is_err() {
            tracing::warn!("Auto-save task is no longer running");
        }
    }

    /// Drop the pending save, if any
    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }
}

impl Drop for AutoSaver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    storage: Arc<dyn FormStorage>,
    settings: AutoSaveSettings,
    gate: SaveGate,
    events: broadcast::Sender<StoreEvent>,
) {
    let mut pending: Option<(u64, FormData)> = None;
    let mut last_save: Option<Instant> = None;

    loop {
        let Some((revision, form)) = pending.take() else {
            match rx.recv().await {
                Some(Command::Schedule { revision, form }) => pending = Some((revision, form)),
                Some(Command::Cancel) => {}
                None => break,
            }
            continue;
        };

        let mut deadline = Instant::now() + settings.debounce;
        if let Some(last) = last_save {
            deadline = deadline.max(last + settings.min_interval);
        }

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Schedule { revision, form }) => pending = Some((revision, form)),
                Some(Command::Cancel) => tracing::debug!("Pending auto-save cancelled"),
                None => break,
            },
            _ = tokio::time::sleep_until(deadline) => {
                match gate.save(storage.as_ref(), revision, &form).await {
                    Ok(false) => {}
                    Ok(true) => {
                        last_save = Some(Instant::now());
                        tracing::debug!("Auto-saved form revision {revision}");
                        let _ = events.send(StoreEvent::Saved { automatic: true });
                    }
                    Err(err) => {
                        tracing::warn!("Auto-save failed: {err}");
                        let _ = events.send(StoreEvent::AutoSaveFailed(err.to_string()));
                    }
                }
            }
        }
    }
}
