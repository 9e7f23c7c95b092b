//! Client-side domain logic: debounced handle reconciliation against the
//! durable store, and orchestration of the per-trigger fetch cycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use github_client::GitHubClient;
use shared::{
    domain::{DisplayState, Repository, UserProfile},
    error::FetchOutcome,
};
use storage::SettingsStore;
use tokio::sync::{broadcast, watch};
use tracing::info;

mod handle_sync;
mod orchestrator;

pub use handle_sync::{HandleSync, SyncEvent, COMMIT_QUIET_PERIOD};
pub use orchestrator::FetchOrchestrator;

/// Durable single-value slot for the tracked handle.
#[async_trait]
pub trait HandleStore: Send + Sync {
    async fn load_handle(&self) -> Result<String>;
    async fn save_handle(&self, value: &str) -> Result<()>;
}

#[async_trait]
impl HandleStore for SettingsStore {
    async fn load_handle(&self) -> Result<String> {
        SettingsStore::load_handle(self).await
    }

    async fn save_handle(&self, value: &str) -> Result<()> {
        SettingsStore::save_handle(self, value).await
    }
}

/// Remote read seam for the two per-trigger resources. Both reads are
/// independent round trips; neither outcome gates the other.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn fetch_profile(&self, handle: &str) -> FetchOutcome<UserProfile>;
    async fn fetch_repositories(&self, handle: &str) -> FetchOutcome<Vec<Repository>>;
}

#[async_trait]
impl ProfileDirectory for GitHubClient {
    async fn fetch_profile(&self, handle: &str) -> FetchOutcome<UserProfile> {
        GitHubClient::fetch_profile(self, handle).await
    }

    async fn fetch_repositories(&self, handle: &str) -> FetchOutcome<Vec<Repository>> {
        GitHubClient::fetch_repositories(self, handle).await
    }
}

/// Wires store, sync and orchestrator together and owns the trigger rules:
/// one fetch cycle at app start when a persisted handle exists, and one per
/// explicit confirm.
pub struct ProfileTracker {
    sync: Arc<HandleSync>,
    orchestrator: Arc<FetchOrchestrator>,
}

impl ProfileTracker {
    pub async fn start(
        store: Arc<dyn HandleStore>,
        directory: Arc<dyn ProfileDirectory>,
    ) -> Result<Arc<Self>> {
        let persisted = store
            .load_handle()
            .await
            .context("failed to read persisted handle")?;

        let sync = HandleSync::new(store);
        sync.on_store_loaded(&persisted);

        let tracker = Arc::new(Self {
            sync,
            orchestrator: FetchOrchestrator::new(directory),
        });

        if persisted.is_empty() {
            info!("no persisted handle; waiting for input before first fetch");
        } else {
            info!(handle = %persisted, "persisted handle found, fetching on start");
            tracker.spawn_refresh(persisted);
        }

        Ok(tracker)
    }

    /// One keystroke (or paste) in the handle input.
    pub fn edit(&self, raw: &str) {
        self.sync.on_edit(raw);
    }

    /// The "done" action: fires a fetch cycle with the reconciled buffer.
    pub fn confirm(&self) {
        self.spawn_refresh(self.sync.buffer());
    }

    pub fn handle_buffer(&self) -> String {
        self.sync.buffer()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DisplayState> {
        self.orchestrator.subscribe_state()
    }

    pub fn subscribe_sync_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.sync.subscribe_events()
    }

    fn spawn_refresh(&self, handle: String) {
        // Triggers run to completion unsupervised; a newer trigger wins via
        // the orchestrator's generation gate.
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move { orchestrator.refresh(&handle).await });
    }
}

#[cfg(test)]
mod tests;
