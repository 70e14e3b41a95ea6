//! User-tunable settings loaded from `beatrush.toml`.

use crate::analysis::DifficultyPolicy;
use crate::models::beat::Difficulty;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default settings file, next to the executable's working directory.
pub const SETTINGS_FILE: &str = "beatrush.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    #[default]
    File,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub songs: PathBuf,
    /// Cache directory: one file per track, or `beatmaps.db` for sqlite.
    pub cache: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            songs: PathBuf::from("songs"),
            cache: PathBuf::from("data/b"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Update loop frequency in Hz.
    pub tick_rate: u32,
    pub default_difficulty: Difficulty,
    /// 0.0 to 1.0
    pub volume: f32,
    /// Fixes lane assignment when set.
    pub lane_seed: Option<u64>,
    /// Let a bot tap every tile (demo mode).
    pub autoplay: bool,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            default_difficulty: Difficulty::Medium,
            volume: 0.5,
            lane_seed: None,
            autoplay: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub difficulty: DifficultyPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub paths: PathSettings,
    pub cache: CacheSettings,
    pub gameplay: GameplaySettings,
    pub analysis: AnalysisSettings,
}

impl Settings {
    /// Loads settings, falling back to defaults when the file is absent or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("SETTINGS: {:?} not found, using defaults", path);
            return Self::default();
        }
        load_toml(path).unwrap_or_default()
    }

    /// Tick rate clamped to something the logic thread can honor.
    pub fn tick_rate(&self) -> u32 {
        self.gameplay.tick_rate.clamp(1, 1000)
    }
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match toml::from_str(&content) {
        Ok(data) => Ok(data),
        Err(e) => {
            log::error!("SETTINGS: Failed to parse TOML file {:?}: {}", path, e);
            Err(e.to_string())
        }
    }
}
