//! Beat map storage with one compressed file per track.
//!
//! Entries are stored as `{dir}/{track_id}.b`, serialized with `bincode` and
//! compressed with zstd (see [`CacheEntry::encode`]).

use super::store::{BeatMapStore, CacheEntry};
use crate::error::CacheError;
use crate::models::TrackId;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path for an entry given its track id.
    pub fn entry_path(&self, track_id: &TrackId) -> PathBuf {
        self.dir.join(format!("{}.b", track_id))
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.entry_path(track_id).exists()
    }
}

impl BeatMapStore for FileStore {
    fn load(&self, track_id: &TrackId) -> Result<Option<CacheEntry>, CacheError> {
        let mut file = match File::open(self.entry_path(track_id)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        CacheEntry::decode(&bytes).map(Some)
    }

    fn save(&self, track_id: &TrackId, entry: &CacheEntry) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let bytes = entry.encode()?;

        // Readers only ever see complete entries.
        let path = self.entry_path(track_id);
        let tmp = path.with_extension("b.tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, track_id: &TrackId) -> Result<(), CacheError> {
        let path = self.entry_path(track_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
