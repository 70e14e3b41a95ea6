//! Beat map persistence and the track catalog.

pub mod connection;
pub mod file_store;
pub mod manager;
pub mod scanner;
pub mod store;

pub use connection::SqliteStore;
pub use file_store::FileStore;
pub use manager::{BeatMapCache, SaveHandle};
pub use scanner::Catalog;
pub use store::{BeatMapStore, CACHE_FORMAT_VERSION, CacheEntry, MemoryStore};

use crate::error::CacheError;
use crate::models::settings::{CacheBackend, Settings};
use std::sync::Arc;

/// Builds the store selected in `settings`.
pub fn open_store(settings: &Settings) -> Result<Arc<dyn BeatMapStore>, CacheError> {
    let path = &settings.paths.cache;
    let store: Arc<dyn BeatMapStore> = match settings.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
        CacheBackend::File => Arc::new(FileStore::new(path.clone())),
        CacheBackend::Sqlite => Arc::new(SqliteStore::open(&path.join("beatmaps.db"))?),
    };
    Ok(store)
}
