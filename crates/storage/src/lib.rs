use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use tokio::sync::watch;
use tracing::debug;

/// The single durable key this store manages.
pub const HANDLE_KEY: &str = "github_handle";

const DEFAULT_DATABASE_URL: &str = "sqlite://./data/githabit.db";

/// Durable single-value settings store backed by SQLite.
///
/// The persisted handle is observable: [`SettingsStore::subscribe_handle`]
/// yields the current value as an initial snapshot plus every successful
/// write. A failed write leaves both the database and the channel
/// untouched.
#[derive(Clone)]
pub struct SettingsStore {
    pool: Pool<Sqlite>,
    handle_tx: Arc<watch::Sender<String>>,
}

impl SettingsStore {
    pub async fn open(database_url: &str) -> Result<Self> {
        let connect_options =
            SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open settings database '{database_url}'"))?;

        Self::ensure_settings_table(&pool).await?;
        let initial = load_value(&pool, HANDLE_KEY).await?.unwrap_or_default();
        let (handle_tx, _) = watch::channel(initial);
        Ok(Self {
            pool,
            handle_tx: Arc::new(handle_tx),
        })
    }

    async fn ensure_settings_table(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .context("failed to ensure settings table exists")?;
        Ok(())
    }

    /// Current handle plus change notifications for every later write.
    pub fn subscribe_handle(&self) -> watch::Receiver<String> {
        self.handle_tx.subscribe()
    }

    pub async fn load_handle(&self) -> Result<String> {
        Ok(load_value(&self.pool, HANDLE_KEY).await?.unwrap_or_default())
    }

    /// Atomic upsert of the handle. Observers are notified only after the
    /// write has landed.
    pub async fn save_handle(&self, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(HANDLE_KEY)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("failed to persist handle")?;

        debug!(value, "persisted handle");
        self.handle_tx.send_replace(value.to_string());
        Ok(())
    }
}

async fn load_value(pool: &Pool<Sqlite>, key: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to read setting '{key}'"))?;
    Ok(row.map(|r| r.get::<String, _>(0)))
}

/// Normalizes a raw database location into a sqlite URL and makes sure the
/// parent directory exists, so first launch works from an empty checkout.
pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}
