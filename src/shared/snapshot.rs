//! Session snapshots for inter-thread communication.
//!
//! Snapshots are immutable captures of controller state sent from the logic
//! thread to front-ends. This decouples gameplay from presentation.

use crate::models::{Difficulty, GameState, GameTile, HitAccuracy, HitStats};

/// One falling tile as a front-end sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileView {
    pub lane: u8,
    /// 0.0 at spawn, 0.92 in the tap zone.
    pub position: f64,
    pub is_hit: bool,
    pub is_missed: bool,
    /// Music time of the underlying beat, in seconds.
    pub beat_time: f64,
}

impl From<&GameTile> for TileView {
    fn from(tile: &GameTile) -> Self {
        Self {
            lane: tile.lane(),
            position: tile.position,
            is_hit: tile.is_hit,
            is_missed: tile.is_missed,
            beat_time: tile.beat.time,
        }
    }
}

/// Snapshot of a game session for rendering or bots.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionSnapshot {
    pub state: GameState,
    /// Music time in seconds, negative during the lead-in.
    pub elapsed: f64,
    /// Title of the selected track, if any.
    pub track_title: Option<String>,
    pub difficulty: Difficulty,

    /// Active tiles in spawn order.
    pub tiles: Vec<TileView>,

    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub hit_stats: HitStats,
    /// Percentage, 0.0 before anything is judged.
    pub accuracy: f64,

    /// Last hit accuracy (for flash display).
    pub last_accuracy: Option<HitAccuracy>,
    /// User-visible notice, e.g. why loading failed.
    pub message: Option<String>,
}

impl SessionSnapshot {
    pub fn is_finished(&self) -> bool {
        self.state == GameState::Finished
    }
}
