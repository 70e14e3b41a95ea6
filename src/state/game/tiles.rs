//! Tile lifecycle - spawn, scroll, auto-miss, retire

use super::GameSession;
use crate::models::{GameTile, HitAccuracy, RETIRE_POSITION};

impl GameSession {
    /// Spawns tiles for every beat whose lead window has opened.
    /// Beats are consumed strictly in order.
    pub(crate) fn spawn_tiles(&mut self, elapsed: f64) {
        let beat_map = std::sync::Arc::clone(&self.beat_map);
        let beats = beat_map.beats(self.difficulty);
        while let Some(beat) = beats.get(self.next_beat) {
            if GameTile::spawn_time(beat) > elapsed {
                break;
            }
            self.tiles.push(GameTile::new(*beat));
            self.next_beat += 1;
        }
    }

    pub(crate) fn move_tiles(&mut self, elapsed: f64) {
        for tile in &mut self.tiles {
            tile.position = GameTile::position_at(&tile.beat, elapsed);
        }
    }

    /// Marks tiles whose good window has passed. A tile is missed at most once.
    pub(crate) fn miss_late_tiles(&mut self, elapsed: f64) {
        let mut misses = 0;
        for tile in &mut self.tiles {
            if !tile.is_judged() && self.hit_window.is_late(tile.beat.time, elapsed) {
                tile.is_missed = true;
                misses += 1;
            }
        }
        for _ in 0..misses {
            self.apply_accuracy(HitAccuracy::Miss, elapsed);
        }
    }

    pub(crate) fn retire_tiles(&mut self) {
        self.tiles.retain(|tile| tile.position <= RETIRE_POSITION);
    }
}
