//! Filesystem scanner that builds the track catalog.

use crate::models::{Track, TrackId};
use rodio::{Decoder, Source};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Extensions rodio can decode with its default features.
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg"];

/// Tracks found under a songs directory.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    /// Scans `songs_path` (and its direct sub-folders) for audio files.
    pub fn scan(songs_path: &Path) -> Self {
        if !songs_path.exists() {
            log::warn!("CATALOG: {:?} does not exist", songs_path);
            return Self::default();
        }

        let mut files = collect_audio_files(songs_path);
        if let Ok(entries) = fs::read_dir(songs_path) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path.is_dir() {
                    files.extend(collect_audio_files(&path));
                }
            }
        }

        let mut tracks: Vec<Track> = files
            .iter()
            .filter_map(|path| match read_track(path) {
                Ok(track) => Some(track),
                Err(e) => {
                    log::error!("CATALOG: Skipping {:?}: {}", path, e);
                    None
                }
            })
            .collect();
        tracks.sort_by(|a, b| a.title.cmp(&b.title));

        log::info!("CATALOG: {} tracks in {:?}", tracks.len(), songs_path);
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn collect_audio_files(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_audio_file(p))
        .collect()
}

/// Identity from the file bytes; duration only when the container reports it.
fn read_track(path: &Path) -> std::io::Result<Track> {
    let bytes = fs::read(path)?;
    let id = TrackId::from_bytes(&bytes);
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string();
    let duration = probe_duration(path);
    Ok(Track::new(id, path.to_path_buf(), title, duration))
}

fn probe_duration(path: &Path) -> Option<f64> {
    let file = File::open(path).ok()?;
    let source = Decoder::new(BufReader::new(file)).ok()?;
    source.total_duration().map(|d| d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scan_picks_audio_files_only() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        let album = dir.join("album");
        fs::create_dir_all(&album).unwrap();
        fs::write(dir.join("b-side.wav"), b"not really audio").unwrap();
        fs::write(album.join("a-side.MP3"), b"also not audio").unwrap();
        fs::write(dir.join("cover.png"), b"png").unwrap();

        let catalog = Catalog::scan(dir);
        let titles: Vec<&str> = catalog.tracks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a-side", "b-side"]);
        // Undecodable payloads still get an identity, just no duration.
        assert!(catalog.tracks().iter().all(|t| t.duration.is_none()));

        let id = catalog.tracks()[0].id.clone();
        assert_eq!(catalog.get(&id).map(|t| t.title.as_str()), Some("a-side"));
    }

    #[test]
    fn missing_directory_is_empty() {
        assert!(Catalog::scan(Path::new("/definitely/not/here")).is_empty());
    }
}
