//! Storage seam for cached beat maps.

use crate::error::CacheError;
use crate::models::{BeatMap, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use zstd::stream::{decode_all, encode_all};

/// Current cache entry format. Entries with another version are treated as
/// misses and recomputed.
pub const CACHE_FORMAT_VERSION: u8 = 1;

/// zstd level for stored entries.
const COMPRESSION_LEVEL: i32 = 9;

/// What gets persisted per track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub version: u8,
    /// Decoded duration in seconds, so a cache hit needs no decode.
    pub duration: Option<f64>,
    pub beat_map: BeatMap,
}

impl CacheEntry {
    pub fn new(beat_map: BeatMap, duration: Option<f64>) -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            duration,
            beat_map,
        }
    }

    pub fn is_current(&self) -> bool {
        self.version == CACHE_FORMAT_VERSION
    }

    /// bincode, then zstd.
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let binary = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| CacheError::Encode(e.to_string()))?;
        Ok(encode_all(&binary[..], COMPRESSION_LEVEL)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        let binary = decode_all(bytes)?;
        let (entry, _len): (CacheEntry, usize) =
            bincode::serde::decode_from_slice(&binary, bincode::config::standard())
                .map_err(|e| CacheError::Decode(e.to_string()))?;
        Ok(entry)
    }
}

/// Blocking key-value persistence for beat maps.
///
/// Implementations are called from background workers only, never from the
/// controller's timeline.
pub trait BeatMapStore: Send + Sync {
    fn load(&self, track_id: &TrackId) -> Result<Option<CacheEntry>, CacheError>;
    fn save(&self, track_id: &TrackId, entry: &CacheEntry) -> Result<(), CacheError>;
    fn remove(&self, track_id: &TrackId) -> Result<(), CacheError>;
    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<TrackId, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> CacheError {
    CacheError::Io(std::io::Error::other("memory store lock poisoned"))
}

impl BeatMapStore for MemoryStore {
    fn load(&self, track_id: &TrackId) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.lock().map_err(|_| poisoned())?;
        Ok(entries.get(track_id).cloned())
    }

    fn save(&self, track_id: &TrackId, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.insert(track_id.clone(), entry.clone());
        Ok(())
    }

    fn remove(&self, track_id: &TrackId) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().map_err(|_| poisoned())?;
        entries.remove(track_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Beat;

    pub fn sample_map() -> BeatMap {
        let beats = vec![
            Beat::new(0.5, 0, 0.41),
            Beat::new(1.0, 3, 0.72),
            Beat::new(1.62, 1, 0.18),
        ];
        BeatMap::new(beats[..2].to_vec(), beats.clone(), beats)
    }

    #[test]
    fn entry_encoding_round_trips() {
        let entry = CacheEntry::new(sample_map(), Some(183.4));
        let bytes = entry.encode().unwrap();
        assert_eq!(CacheEntry::decode(&bytes).unwrap(), entry);
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(CacheEntry::decode(b"definitely not zstd").is_err());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        let id = TrackId::new("abc");
        assert!(store.load(&id).unwrap().is_none());

        let entry = CacheEntry::new(sample_map(), None);
        store.save(&id, &entry).unwrap();
        assert_eq!(store.load(&id).unwrap(), Some(entry));
        assert_eq!(store.len(), 1);

        store.remove(&id).unwrap();
        assert!(store.is_empty());
    }
}
