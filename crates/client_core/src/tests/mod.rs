use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Repository, UserProfile},
    error::FetchOutcome,
};

use crate::{HandleStore, ProfileDirectory};


pub(crate) fn sample_profile(login: &str) -> UserProfile {
    UserProfile {
        login: login.to_string(),
        avatar_url: format!("https://avatars.githubusercontent.com/{login}"),
        bio: None,
        public_repos: 8,
    }
}

pub(crate) fn sample_repo(updated_at: &str) -> Repository {
    Repository {
        id: 42,
        name: "tracker".to_string(),
        full_name: "octocat/tracker".to_string(),
        description: None,
        html_url: "https://github.com/octocat/tracker".to_string(),
        stargazers_count: 7,
        forks_count: 2,
        watchers_count: 7,
        language: Some("Rust".to_string()),
        private: false,
        updated_at: updated_at.parse().expect("timestamp"),
    }
}

/// Store double that records writes, optionally failing them all.
pub(crate) struct RecordingStore {
    initial: String,
    fail_with: Option<String>,
    saves: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub(crate) fn empty() -> Arc<Self> {
        Self::with_initial("")
    }

    pub(crate) fn with_initial(initial: &str) -> Arc<Self> {
        Arc::new(Self {
            initial: initial.to_string(),
            fail_with: None,
            saves: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            initial: String::new(),
            fail_with: Some(reason.to_string()),
            saves: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn saves(&self) -> Vec<String> {
        self.saves.lock().expect("saves lock").clone()
    }
}

#[async_trait]
impl HandleStore for RecordingStore {
    async fn load_handle(&self) -> Result<String> {
        Ok(self.initial.clone())
    }

    async fn save_handle(&self, value: &str) -> Result<()> {
        if let Some(reason) = &self.fail_with {
            return Err(anyhow!(reason.clone()));
        }
        self.saves
            .lock()
            .expect("saves lock")
            .push(value.to_string());
        Ok(())
    }
}

/// Directory double with fixed outcomes and per-resource call counters.
pub(crate) struct StubDirectory {
    profile_outcome: FetchOutcome<UserProfile>,
    repos_outcome: FetchOutcome<Vec<Repository>>,
    pub(crate) profile_calls: AtomicU64,
    pub(crate) repos_calls: AtomicU64,
}

impl StubDirectory {
    pub(crate) fn new(
        profile_outcome: FetchOutcome<UserProfile>,
        repos_outcome: FetchOutcome<Vec<Repository>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            profile_outcome,
            repos_outcome,
            profile_calls: AtomicU64::new(0),
            repos_calls: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl ProfileDirectory for StubDirectory {
    async fn fetch_profile(&self, _handle: &str) -> FetchOutcome<UserProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profile_outcome.clone()
    }

    async fn fetch_repositories(&self, _handle: &str) -> FetchOutcome<Vec<Repository>> {
        self.repos_calls.fetch_add(1, Ordering::SeqCst);
        self.repos_outcome.clone()
    }
}

/// Directory double whose profile responses are scripted per trigger, each
/// with its own artificial latency.
pub(crate) struct SequencedDirectory {
    responses: Mutex<VecDeque<(Duration, FetchOutcome<UserProfile>)>>,
}

impl SequencedDirectory {
    pub(crate) fn new(
        responses: impl IntoIterator<Item = (Duration, FetchOutcome<UserProfile>)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
        })
    }
}

#[async_trait]
impl ProfileDirectory for SequencedDirectory {
    async fn fetch_profile(&self, _handle: &str) -> FetchOutcome<UserProfile> {
        let (delay, outcome) = self
            .responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .expect("scripted profile response");
        tokio::time::sleep(delay).await;
        outcome
    }

    async fn fetch_repositories(&self, _handle: &str) -> FetchOutcome<Vec<Repository>> {
        Ok(Vec::new())
    }
}
