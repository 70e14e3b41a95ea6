//! Plain data shared by the analysis pipeline, the cache and the controller.

pub mod beat;
pub mod hit_window;
pub mod settings;
pub mod stats;
pub mod tile;
pub mod track;

pub use beat::{Beat, BeatMap, Difficulty, MIN_BEAT_INTERVAL, NUM_LANES};
pub use hit_window::HitWindow;
pub use settings::Settings;
pub use stats::{HitAccuracy, HitStats};
pub use tile::{GameTile, LEAD_TIME, RETIRE_POSITION, TAP_ZONE_POSITION};
pub use track::{Track, TrackId};

/// Game controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Selecting,
    Loading,
    Playing,
    Paused,
    Finished,
}
