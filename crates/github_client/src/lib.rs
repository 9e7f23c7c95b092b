//! Read-only GitHub REST client with outcome classification.
//!
//! Every call is an independent round trip: no caching, no retry. Failures
//! collapse into the two-variant taxonomy in [`shared::error::FetchError`]
//! so callers reduce outcomes into display state instead of propagating
//! transport details.

use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Repository, UserProfile},
    error::{FetchError, FetchOutcome},
};
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = "githabit";
/// Page size cap for the repository list; one page is all we ever fetch.
pub const REPO_PAGE_SIZE: u32 = 100;

pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE, token)
    }

    /// Same client against a different API root, used by tests and
    /// self-hosted mirrors.
    pub fn with_base_url(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(API_MEDIA_TYPE));
        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Profile summary for `handle`. Attaches the bearer credential when
    /// one is configured; the repository fetch stays unauthenticated.
    pub async fn fetch_profile(&self, handle: &str) -> FetchOutcome<UserProfile> {
        let url = format!("{}/users/{handle}", self.base_url);
        debug!(handle, "fetching profile");
        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        decode_resource(request.send().await).await
    }

    /// Repository list for `handle`, most-recently-updated first, capped at
    /// [`REPO_PAGE_SIZE`] entries.
    pub async fn fetch_repositories(&self, handle: &str) -> FetchOutcome<Vec<Repository>> {
        let url = format!("{}/users/{handle}/repos", self.base_url);
        debug!(handle, "fetching repositories");
        let request = self.http.get(&url).query(&[
            ("sort", "updated".to_string()),
            ("per_page", REPO_PAGE_SIZE.to_string()),
        ]);
        decode_resource(request.send().await).await
    }
}

async fn decode_resource<T: DeserializeOwned>(
    sent: reqwest::Result<Response>,
) -> FetchOutcome<T> {
    let response = sent.map_err(FetchError::transport)?;
    let status = response.status();
    let body = response.text().await.map_err(FetchError::transport)?;
    classify_body(status, &body)
}

/// Decode-first classification. GitHub answers unknown handles and rate
/// limits with JSON error documents, which read as a well-formed body of
/// the wrong shape; only a response that is not data at all counts as a
/// transport failure.
fn classify_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> FetchOutcome<T> {
    match serde_json::from_str::<T>(body) {
        Ok(value) => Ok(value),
        Err(_) if serde_json::from_str::<serde_json::Value>(body).is_ok() => {
            warn!(%status, "response shape did not match the requested resource");
            Err(FetchError::SchemaMismatch)
        }
        Err(_) => Err(FetchError::Transport(format!(
            "unexpected non-JSON response (status {status})"
        ))),
    }
}
