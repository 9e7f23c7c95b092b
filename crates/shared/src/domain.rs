use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown when the tracked user has no repositories at all.
pub const NO_ACTIVITY_LABEL: &str = "NEVER";

/// Profile summary for the tracked handle, as returned by `/users/{handle}`.
///
/// GitHub sends many more fields than these; unknown fields are ignored so
/// additive API drift never breaks decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub avatar_url: String,
    pub bio: Option<String>,
    pub public_repos: u32,
}

/// One entry of the repository list, most-recently-updated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub watchers_count: u32,
    pub language: Option<String>,
    pub private: bool,
    pub updated_at: DateTime<Utc>,
}

/// Display-ready bundle derived from the last completed fetch cycle.
///
/// Rebuilt wholesale on every trigger; never persisted. `handle_invalid`
/// and `last_error` only reflect the profile fetch. A failed repository
/// fetch collapses into `repos = None` with no separate flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    pub profile: Option<UserProfile>,
    pub repos: Option<Vec<Repository>>,
    pub handle_invalid: bool,
    pub last_error: Option<String>,
}

impl DisplayState {
    /// Date of the most recent repository update, or [`NO_ACTIVITY_LABEL`]
    /// when the user has no repositories. `None` while the repository list
    /// is unresolved or failed.
    pub fn last_activity_label(&self) -> Option<String> {
        let repos = self.repos.as_ref()?;
        Some(match repos.first() {
            Some(repo) => repo.updated_at.date_naive().to_string(),
            None => NO_ACTIVITY_LABEL.to_string(),
        })
    }
}
