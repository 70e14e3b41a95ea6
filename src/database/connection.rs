//! SQLite-backed beat map store.

use super::store::{BeatMapStore, CacheEntry};
use crate::error::CacheError;
use crate::models::TrackId;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::runtime::Runtime;

/// Stores compressed entries in a single `beat_map_cache` table.
///
/// Owns a small tokio runtime so callers on plain worker threads can use the
/// blocking [`BeatMapStore`] API.
pub struct SqliteStore {
    pool: SqlitePool,
    runtime: Runtime,
}

impl SqliteStore {
    /// Opens or creates the database.
    pub fn open(db_path: &Path) -> Result<Self, CacheError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cache-db")
            .enable_all()
            .build()?;
        let pool = runtime.block_on(Self::connect(db_path))?;
        Ok(Self { pool, runtime })
    }

    async fn connect(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let absolute_path = if db_path.is_absolute() {
            db_path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(db_path)
        };

        let options = SqliteConnectOptions::new()
            .filename(&absolute_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::init_schema(&pool).await?;
        Ok(pool)
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS beat_map_cache (
                track_id TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Number of cached tracks.
    pub fn count(&self) -> Result<i64, CacheError> {
        let count = self.runtime.block_on(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM beat_map_cache").fetch_one(&self.pool),
        )?;
        Ok(count)
    }
}

impl BeatMapStore for SqliteStore {
    fn load(&self, track_id: &TrackId) -> Result<Option<CacheEntry>, CacheError> {
        let data: Option<Vec<u8>> = self.runtime.block_on(
            sqlx::query_scalar("SELECT data FROM beat_map_cache WHERE track_id = ?1")
                .bind(track_id.as_str())
                .fetch_optional(&self.pool),
        )?;
        data.map(|bytes| CacheEntry::decode(&bytes)).transpose()
    }

    fn save(&self, track_id: &TrackId, entry: &CacheEntry) -> Result<(), CacheError> {
        let data = entry.encode()?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        self.runtime.block_on(
            sqlx::query(
                "INSERT INTO beat_map_cache (track_id, data, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(track_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            )
            .bind(track_id.as_str())
            .bind(data)
            .bind(timestamp)
            .execute(&self.pool),
        )?;
        Ok(())
    }

    fn remove(&self, track_id: &TrackId) -> Result<(), CacheError> {
        self.runtime.block_on(
            sqlx::query("DELETE FROM beat_map_cache WHERE track_id = ?1")
                .bind(track_id.as_str())
                .execute(&self.pool),
        )?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}
