//! Per-trigger fetch cycle: run both remote reads, reduce their outcomes
//! independently, publish a fresh display state.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{DisplayState, Repository, UserProfile},
    error::{FetchError, FetchOutcome},
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::ProfileDirectory;

pub struct FetchOrchestrator {
    directory: Arc<dyn ProfileDirectory>,
    state_tx: watch::Sender<DisplayState>,
    /// Generation of the most recently issued trigger. Completed cycles
    /// apply their result only while still the latest; anything older is
    /// discarded so a slow early trigger can never overwrite a newer one.
    latest_trigger: AtomicU64,
    apply_gate: Mutex<()>,
}

impl FetchOrchestrator {
    pub fn new(directory: Arc<dyn ProfileDirectory>) -> Arc<Self> {
        let (state_tx, _) = watch::channel(DisplayState::default());
        Arc::new(Self {
            directory,
            state_tx,
            latest_trigger: AtomicU64::new(0),
            apply_gate: Mutex::new(()),
        })
    }

    /// Current state plus a notification per applied trigger.
    pub fn subscribe_state(&self) -> watch::Receiver<DisplayState> {
        self.state_tx.subscribe()
    }

    pub fn current_state(&self) -> DisplayState {
        self.state_tx.borrow().clone()
    }

    /// One full fetch cycle for `handle`. Runs to completion; overlapping
    /// cycles are resolved by the generation gate, not by cancellation.
    pub async fn refresh(&self, handle: &str) {
        let generation = self.latest_trigger.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, handle, "starting fetch cycle");

        let (profile_outcome, repos_outcome) = tokio::join!(
            self.directory.fetch_profile(handle),
            self.directory.fetch_repositories(handle),
        );
        let next = reduce_outcomes(profile_outcome, repos_outcome);

        let _gate = self.apply_gate.lock().await;
        if self.latest_trigger.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale fetch results");
            return;
        }
        self.state_tx.send_replace(next);
    }
}

/// Reduces the two independent outcomes into a whole new display state.
///
/// The profile outcome drives the error surface; a repository failure only
/// collapses into "no repository data", deliberately coarser than the
/// profile path.
fn reduce_outcomes(
    profile: FetchOutcome<UserProfile>,
    repos: FetchOutcome<Vec<Repository>>,
) -> DisplayState {
    let mut state = DisplayState::default();

    match profile {
        Ok(profile) => {
            info!(login = %profile.login, "profile retrieved");
            state.profile = Some(profile);
        }
        Err(FetchError::SchemaMismatch) => {
            warn!("profile response did not match; treating handle as invalid");
            state.handle_invalid = true;
        }
        Err(FetchError::Transport(cause)) => {
            warn!(%cause, "profile fetch failed");
            state.last_error = Some(cause);
        }
    }

    match repos {
        Ok(repos) => {
            info!(count = repos.len(), "repositories retrieved");
            state.repos = Some(repos);
        }
        Err(err) => {
            warn!(error = %err, "repository fetch failed; dropping repository data");
        }
    }

    state
}
