// ── Durable device store ──
//
// One SQLite table of known devices keyed by hardware address. The
// uniqueness constraint lives in the schema, so insert-if-absent stays
// correct even when two reconciliation passes race. Timestamps are stored
// as Unix milliseconds.

mod devices;
mod schema;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::CoreError;

pub use devices::start_of_local_day;

const MAX_CONNECTIONS: u32 = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the device database. Cheap to clone (pool handle).
#[derive(Debug, Clone)]
pub struct DeviceStore {
    pool: SqlitePool,
}

impl DeviceStore {
    /// Open (creating if needed) the database file at `path` and make sure
    /// the schema exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::Configuration {
                message: format!("cannot create database directory {}: {e}", parent.display()),
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        info!(path = %path.display(), "device store opened");
        Self::from_pool(pool).await
    }

    /// A private in-memory database. Single connection, so every query
    /// sees the same data.
    pub async fn in_memory() -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CoreError> {
        for statement in schema::SCHEMA {
            sqlx::query(*statement).execute(&pool).await?;
        }
        debug!("device schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
