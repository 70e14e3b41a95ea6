//! Asynchronous front for a [`BeatMapStore`].
//!
//! Reads are synchronous and meant for background workers (the track loader).
//! Writes are queued to a dedicated cache thread and never awaited by
//! gameplay; each one hands back a [`SaveHandle`] that can be polled for its
//! outcome.

use super::store::{BeatMapStore, CacheEntry};
use crate::error::CacheError;
use crate::models::{BeatMap, TrackId};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Debug)]
enum CacheCommand {
    Save {
        track_id: TrackId,
        entry: CacheEntry,
        done: Sender<Result<(), CacheError>>,
    },
    Shutdown,
}

/// Outcome of a detached cache write.
pub struct SaveHandle {
    rx: Receiver<Result<(), CacheError>>,
}

impl SaveHandle {
    fn failed(err: CacheError) -> Self {
        let (tx, rx) = bounded(1);
        let _ = tx.send(Err(err));
        Self { rx }
    }

    /// `None` while the write is still pending.
    pub fn try_outcome(&self) -> Option<Result<(), CacheError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            // Dropped by a shutdown before it ran.
            Err(TryRecvError::Disconnected) => Some(Err(CacheError::Runtime)),
        }
    }

    /// Blocks up to `timeout`. Gameplay never calls this.
    pub fn wait(&self, timeout: Duration) -> Option<Result<(), CacheError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(CacheError::Runtime)),
        }
    }
}

/// Shared handle to the beat map cache. Cheap to clone.
#[derive(Clone)]
pub struct BeatMapCache {
    store: Arc<dyn BeatMapStore>,
    command_sender: Sender<CacheCommand>,
    closing: Arc<AtomicBool>,
}

impl BeatMapCache {
    /// Wraps `store` and starts the cache writer thread.
    pub fn new(store: Arc<dyn BeatMapStore>) -> Self {
        let (tx, rx) = unbounded();
        let closing = Arc::new(AtomicBool::new(false));

        let worker_store = Arc::clone(&store);
        let worker_closing = Arc::clone(&closing);
        thread::Builder::new()
            .name("Cache Thread".to_string())
            .spawn(move || Self::writer_thread(worker_store, rx, worker_closing))
            .expect("Failed to spawn Cache thread");

        log::info!("CACHE: Using {} backend", store.name());
        Self {
            store,
            command_sender: tx,
            closing,
        }
    }

    fn writer_thread(
        store: Arc<dyn BeatMapStore>,
        rx: Receiver<CacheCommand>,
        closing: Arc<AtomicBool>,
    ) {
        while let Ok(cmd) = rx.recv() {
            match cmd {
                CacheCommand::Save {
                    track_id,
                    entry,
                    done,
                } => {
                    if closing.load(Ordering::Acquire) {
                        // Pending writes are dropped on teardown.
                        continue;
                    }
                    let result = store.save(&track_id, &entry);
                    match &result {
                        Ok(()) => log::debug!("CACHE: Stored beat map for {}", track_id),
                        Err(e) => log::warn!("CACHE: Failed to store {}: {}", track_id, e),
                    }
                    let _ = done.send(result);
                }
                CacheCommand::Shutdown => break,
            }
        }
        log::info!("CACHE: Writer stopped");
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Reads an entry, surfacing store errors. Blocking.
    pub fn try_load(&self, track_id: &TrackId) -> Result<Option<CacheEntry>, CacheError> {
        match self.store.load(track_id)? {
            Some(entry) if entry.is_current() => Ok(Some(entry)),
            Some(entry) => {
                log::info!(
                    "CACHE: Ignoring format v{} entry for {}",
                    entry.version,
                    track_id
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Reads an entry; any failure counts as a miss. Blocking.
    pub fn load(&self, track_id: &TrackId) -> Option<CacheEntry> {
        self.try_load(track_id).unwrap_or_else(|e| {
            log::warn!("CACHE: Read failed for {} ({}), treating as miss", track_id, e);
            None
        })
    }

    /// Queues a best-effort write and returns immediately.
    pub fn save(&self, track_id: &TrackId, beat_map: &BeatMap, duration: Option<f64>) -> SaveHandle {
        if self.closing.load(Ordering::Acquire) {
            return SaveHandle::failed(CacheError::Runtime);
        }
        let (done, rx) = bounded(1);
        let cmd = CacheCommand::Save {
            track_id: track_id.clone(),
            entry: CacheEntry::new(beat_map.clone(), duration),
            done,
        };
        match self.command_sender.send(cmd) {
            Ok(()) => SaveHandle { rx },
            Err(_) => {
                log::warn!("CACHE: Writer is gone, dropping write for {}", track_id);
                SaveHandle::failed(CacheError::Runtime)
            }
        }
    }

    /// Stops the writer without flushing queued writes. Non-blocking.
    pub fn shutdown(&self) {
        self.closing.store(true, Ordering::Release);
        let _ = self.command_sender.send(CacheCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::tests::sample_map;
    use crate::database::store::{CACHE_FORMAT_VERSION, MemoryStore};

    const WAIT: Duration = Duration::from_secs(5);

    /// Store whose every call fails.
    struct BrokenStore;

    impl BeatMapStore for BrokenStore {
        fn load(&self, _: &TrackId) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Io(std::io::Error::other("disk on fire")))
        }
        fn save(&self, _: &TrackId, _: &CacheEntry) -> Result<(), CacheError> {
            Err(CacheError::Io(std::io::Error::other("disk on fire")))
        }
        fn remove(&self, _: &TrackId) -> Result<(), CacheError> {
            Ok(())
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let cache = BeatMapCache::new(Arc::new(MemoryStore::new()));
        let id = TrackId::new("track-1");
        let map = sample_map();

        assert!(cache.load(&id).is_none());
        let handle = cache.save(&id, &map, Some(42.0));
        assert!(matches!(handle.wait(WAIT), Some(Ok(()))));

        let entry = cache.load(&id).unwrap();
        assert_eq!(entry.beat_map, map);
        assert_eq!(entry.duration, Some(42.0));
        cache.shutdown();
    }

    #[test]
    fn store_failures_degrade_quietly() {
        let cache = BeatMapCache::new(Arc::new(BrokenStore));
        let id = TrackId::new("track-2");

        assert!(cache.load(&id).is_none());
        assert!(cache.try_load(&id).is_err());
        let handle = cache.save(&id, &sample_map(), None);
        assert!(matches!(handle.wait(WAIT), Some(Err(CacheError::Io(_)))));
        cache.shutdown();
    }

    #[test]
    fn stale_format_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        let id = TrackId::new("old");
        let mut entry = CacheEntry::new(sample_map(), None);
        entry.version = CACHE_FORMAT_VERSION.wrapping_add(1);
        store.save(&id, &entry).unwrap();

        let cache = BeatMapCache::new(store);
        assert!(cache.load(&id).is_none());
        cache.shutdown();
    }

    #[test]
    fn writes_after_shutdown_fail_fast() {
        let cache = BeatMapCache::new(Arc::new(MemoryStore::new()));
        cache.shutdown();
        let handle = cache.save(&TrackId::new("late"), &sample_map(), None);
        assert!(matches!(handle.try_outcome(), Some(Err(CacheError::Runtime))));
    }
}
