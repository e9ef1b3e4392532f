use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

pub mod books;

pub use books::{
    count_records, latest_scraped_at, list_records, replace_dataset, BookRow, BOOKS_TABLE,
};

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// Location and pool settings for the SQLite store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file. Its parent directory is created on connect.
    pub path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl StoreConfig {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &shelfdb_core::AppConfig) -> Self {
        Self {
            path: config.db_path.clone(),
            max_connections: config.db_max_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("cannot create store directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid stored row: {0}")]
    InvalidRow(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open the SQLite pool described by `config`.
///
/// The database file's parent directory is created first; an existing
/// directory is fine. The file itself is created if missing and opened in WAL
/// mode so readers keep seeing the previous snapshot while a load is running.
///
/// # Errors
///
/// Returns [`DbError::Io`] if the directory cannot be created, or
/// [`DbError::Sqlx`] if the database cannot be opened.
pub async fn connect_pool(config: &StoreConfig) -> Result<SqlitePool, DbError> {
    ensure_parent_dir(&config.path)?;

    let acquire_timeout = Duration::from_secs(config.acquire_timeout_secs);
    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(acquire_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;

    tracing::debug!(path = %config.path.display(), "opened store");
    Ok(pool)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<(), DbError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| DbError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
