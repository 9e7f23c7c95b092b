//! Headless front end: each stdin line edits the handle and confirms it,
//! the resulting display state is rendered to stdout. The visual surface
//! proper lives elsewhere; this binary exists to run the stack end to end.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{ProfileTracker, SyncEvent};
use github_client::GitHubClient;
use shared::domain::DisplayState;
use storage::SettingsStore;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(about = "Track a GitHub handle and its most recent repository activity")]
struct Args {
    /// Where the handle is persisted across restarts.
    #[arg(long, default_value = "sqlite://./data/githabit.db")]
    database_url: String,
    /// Alternate API root, mainly for local mock servers.
    #[arg(long)]
    api_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();
    let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());

    let database_url = storage::prepare_database_url(&args.database_url)?;
    let store = Arc::new(
        SettingsStore::open(&database_url)
            .await
            .context("failed to open settings store")?,
    );
    tracing::info!(%database_url, "settings store ready");
    let client = match args.api_base {
        Some(base) => GitHubClient::with_base_url(base, token)?,
        None => GitHubClient::new(token)?,
    };

    let tracker = ProfileTracker::start(store, Arc::new(client)).await?;
    let mut state_rx = tracker.subscribe_state();
    let mut sync_events = tracker.subscribe_sync_events();

    if tracker.handle_buffer().is_empty() {
        println!("Please enter your GitHub handle!");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                tracker.edit(&line);
                tracker.confirm();
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                render(&state);
            }
            event = sync_events.recv() => {
                if let Ok(SyncEvent::HandleCommitFailed { value, reason }) = event {
                    eprintln!("could not save handle '{value}': {reason}");
                }
            }
        }
    }

    Ok(())
}

fn render(state: &DisplayState) {
    if state.handle_invalid {
        println!("Invalid GitHub handle or rate limit exceeded");
    }
    if let Some(error) = &state.last_error {
        println!("Error: {error}");
    }
    if let Some(label) = state.last_activity_label() {
        println!("Last Commit: {label}");
    }

    match &state.profile {
        Some(profile) => {
            println!("Handle: {}", profile.login);
            println!("Public Repos: {}", profile.public_repos);
            if let Some(bio) = &profile.bio {
                println!("Bio: {bio}");
            }
        }
        None => println!("Profile data could not be loaded"),
    }

    match &state.repos {
        Some(repos) if repos.is_empty() => println!("No public repositories"),
        Some(repos) => {
            for repo in repos {
                println!("  {}", repo.full_name);
            }
        }
        None => println!("Repository data could not be loaded"),
    }
}
