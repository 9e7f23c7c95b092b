//! Debounced reconciliation between the live edit buffer and the durable
//! handle store.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::HandleStore;

/// Quiet period a value must survive unedited before it is persisted.
pub const COMMIT_QUIET_PERIOD: Duration = Duration::from_millis(500);

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The debounce window elapsed and the value landed in the store.
    HandleCommitted(String),
    /// The store write failed; the buffer keeps the unsaved value and no
    /// retry is scheduled.
    HandleCommitFailed { value: String, reason: String },
}

struct SyncInner {
    buffer: String,
    last_persisted: String,
    store_loaded: bool,
    /// Bumped on every edit; a scheduled commit fires only if its tag is
    /// still current on expiry, so restarting the window supersedes any
    /// prior timer without a second write.
    generation: u64,
}

/// Reconciles the frequently-changing input buffer with the single-value
/// store. Buffer updates are synchronous (plain mutex, no suspension);
/// only the eventual store write is async.
pub struct HandleSync {
    store: Arc<dyn HandleStore>,
    inner: Arc<Mutex<SyncInner>>,
    events: broadcast::Sender<SyncEvent>,
}

impl HandleSync {
    pub fn new(store: Arc<dyn HandleStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            store,
            inner: Arc::new(Mutex::new(SyncInner {
                buffer: String::new(),
                last_persisted: String::new(),
                store_loaded: false,
                generation: 0,
            })),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn buffer(&self) -> String {
        self.lock_inner().buffer.clone()
    }

    /// First delivery of the persisted value. Adopts it into the buffer
    /// only while the buffer is still at its unset default, so a slow
    /// store load never clobbers in-progress typing. Later calls are
    /// ignored.
    pub fn on_store_loaded(&self, persisted: &str) {
        let mut inner = self.lock_inner();
        if inner.store_loaded {
            return;
        }
        inner.store_loaded = true;
        inner.last_persisted = persisted.to_string();
        if inner.buffer.is_empty() {
            inner.buffer = persisted.to_string();
        }
    }

    /// One edit of the input. Line breaks are stripped, the buffer updates
    /// immediately, and the commit window restarts: each edit supersedes
    /// the previous timer, so at most one commit is ever pending.
    pub fn on_edit(&self, raw: &str) {
        let text = strip_line_breaks(raw);

        let generation = {
            let mut inner = self.lock_inner();
            inner.buffer = text.clone();
            inner.generation += 1;
            if text == inner.last_persisted {
                // Back in sync with the store; the bump above already
                // cancelled any pending commit.
                return;
            }
            inner.generation
        };

        let store = Arc::clone(&self.store);
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COMMIT_QUIET_PERIOD).await;
            commit_if_current(store, inner, events, generation, text).await;
        });
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, SyncInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn commit_if_current(
    store: Arc<dyn HandleStore>,
    inner: Arc<Mutex<SyncInner>>,
    events: broadcast::Sender<SyncEvent>,
    generation: u64,
    text: String,
) {
    {
        let inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.generation != generation {
            debug!(generation, "commit superseded by a newer edit");
            return;
        }
    }

    match store.save_handle(&text).await {
        Ok(()) => {
            debug!(value = %text, "handle committed");
            let mut inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // The store now holds `text` even if a newer edit arrived while
            // the write was in flight.
            inner.last_persisted = text.clone();
            drop(inner);
            let _ = events.send(SyncEvent::HandleCommitted(text));
        }
        Err(err) => {
            warn!(value = %text, error = %err, "handle commit failed; keeping unsaved buffer");
            let _ = events.send(SyncEvent::HandleCommitFailed {
                value: text,
                reason: err.to_string(),
            });
        }
    }
}

fn strip_line_breaks(raw: &str) -> String {
    raw.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}
