//! Core gameplay session for the four-lane tap game.
//!
//! The `GameSession` owns everything that changes while a track plays:
//! - Tile spawning, scrolling and retirement
//! - Hit detection and auto-misses
//! - Score, combo and accuracy tracking
//!
//! It is driven purely by elapsed music time; clocks and audio live in the
//! controller.

mod input;
mod tiles;

use crate::models::{Beat, BeatMap, Difficulty, GameTile, HitAccuracy, HitStats, HitWindow};
use crate::shared::snapshot::TileView;
use std::sync::Arc;

/// How long the last accuracy stays visible, in seconds.
pub const LAST_ACCURACY_SECONDS: f64 = 0.3;

pub struct GameSession {
    beat_map: Arc<BeatMap>,
    difficulty: Difficulty,
    /// Index of the next beat to spawn.
    next_beat: usize,
    /// Active tiles in spawn order.
    tiles: Vec<GameTile>,

    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub hit_stats: HitStats,

    /// Last accuracy and the music time it was produced at.
    last_accuracy: Option<(HitAccuracy, f64)>,
    hit_window: HitWindow,
}

impl GameSession {
    pub fn new(beat_map: Arc<BeatMap>, difficulty: Difficulty) -> Self {
        Self {
            beat_map,
            difficulty,
            next_beat: 0,
            tiles: Vec::new(),
            score: 0,
            combo: 0,
            max_combo: 0,
            hit_stats: HitStats::new(),
            last_accuracy: None,
            hit_window: HitWindow::new(),
        }
    }

    /// A fresh session over the same beat map.
    pub fn restart(&self, difficulty: Difficulty) -> Self {
        Self::new(Arc::clone(&self.beat_map), difficulty)
    }

    /// Advances the session to `elapsed` seconds of music time.
    pub fn update(&mut self, elapsed: f64) {
        self.spawn_tiles(elapsed);
        self.move_tiles(elapsed);
        self.miss_late_tiles(elapsed);
        self.retire_tiles();

        if let Some((_, at)) = self.last_accuracy
            && elapsed - at > LAST_ACCURACY_SECONDS
        {
            self.last_accuracy = None;
        }
    }

    pub fn beat_map(&self) -> &Arc<BeatMap> {
        &self.beat_map
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn beats(&self) -> &[Beat] {
        self.beat_map.beats(self.difficulty)
    }

    pub fn tiles(&self) -> &[GameTile] {
        &self.tiles
    }

    pub fn tile_views(&self) -> Vec<TileView> {
        self.tiles.iter().map(TileView::from).collect()
    }

    pub fn last_accuracy(&self) -> Option<HitAccuracy> {
        self.last_accuracy.map(|(accuracy, _)| accuracy)
    }

    pub fn accuracy(&self) -> f64 {
        self.hit_stats.calculate_accuracy()
    }

    /// Every beat has spawned and every tile has left the screen.
    pub fn is_exhausted(&self) -> bool {
        self.next_beat >= self.beats().len() && self.tiles.is_empty()
    }

    /// Applies an accuracy to score, combo and stats.
    pub(crate) fn apply_accuracy(&mut self, accuracy: HitAccuracy, at: f64) {
        self.hit_stats.record(accuracy);
        self.last_accuracy = Some((accuracy, at));
        match accuracy {
            HitAccuracy::Miss => {
                self.combo = 0;
            }
            HitAccuracy::Perfect | HitAccuracy::Good => {
                self.combo += 1;
                self.max_combo = self.max_combo.max(self.combo);
                let multiplier = u64::from((self.combo / 10 + 1).max(1));
                let gained = u64::from(accuracy.points()).saturating_mul(multiplier);
                self.score = self.score.saturating_add(gained);
            }
        }
    }
}
