//! Tap handling for GameSession - tap_lane
//!
//! All times are music seconds (f64).

use super::GameSession;
use crate::models::{HitAccuracy, NUM_LANES};

impl GameSession {
    /// Judges a tap on `lane` at `elapsed`.
    ///
    /// Picks the active, unjudged tile in the lane closest to `elapsed`. Taps
    /// outside the good window return `None` and change nothing.
    pub fn tap_lane(&mut self, lane: u8, elapsed: f64) -> Option<HitAccuracy> {
        if lane as usize >= NUM_LANES {
            return None;
        }

        let (idx, diff) = self
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.lane() == lane && !tile.is_judged())
            .map(|(i, tile)| (i, (elapsed - tile.beat.time).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        let accuracy = self.hit_window.judge(diff)?;
        self.tiles[idx].is_hit = true;
        self.apply_accuracy(accuracy, elapsed);
        Some(accuracy)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{Beat, BeatMap, Difficulty, HitAccuracy};
    use crate::state::GameSession;
    use std::sync::Arc;

    fn single_beat_session(time: f64) -> GameSession {
        let beats = vec![Beat::new(time, 2, 0.5)];
        let map = BeatMap::new(beats.clone(), beats.clone(), beats);
        let mut session = GameSession::new(Arc::new(map), Difficulty::Medium);
        session.update(time - 0.5);
        session
    }

    #[test]
    fn tap_on_the_beat_is_perfect() {
        let mut session = single_beat_session(4.0);
        assert_eq!(session.tap_lane(2, 4.0), Some(HitAccuracy::Perfect));
        assert_eq!(session.score, 100);
        assert!(session.tiles()[0].is_hit);
    }

    #[test]
    fn slightly_late_tap_is_good() {
        let mut session = single_beat_session(4.0);
        assert_eq!(session.tap_lane(2, 4.07), Some(HitAccuracy::Good));
        assert_eq!(session.score, 50);
        assert_eq!(session.hit_stats.good, 1);
    }

    #[test]
    fn tap_outside_window_is_ignored() {
        let mut session = single_beat_session(4.0);
        assert_eq!(session.tap_lane(2, 4.15), None);
        assert_eq!(session.tap_lane(2, 3.8), None);
        assert_eq!(session.score, 0);
        assert_eq!(session.combo, 0);
        assert_eq!(session.hit_stats.judged(), 0);
        assert!(!session.tiles()[0].is_judged());
    }

    #[test]
    fn wrong_lane_and_double_taps_are_ignored() {
        let mut session = single_beat_session(4.0);
        assert_eq!(session.tap_lane(1, 4.0), None);
        assert_eq!(session.tap_lane(9, 4.0), None);
        assert_eq!(session.tap_lane(2, 4.0), Some(HitAccuracy::Perfect));
        assert_eq!(session.tap_lane(2, 4.01), None);
        assert_eq!(session.score, 100);
    }

    #[test]
    fn nearest_tile_wins() {
        let beats = vec![Beat::new(4.0, 0, 0.5), Beat::new(4.14, 0, 0.5)];
        let map = BeatMap::new(beats.clone(), beats.clone(), beats);
        let mut session = GameSession::new(Arc::new(map), Difficulty::Medium);
        session.update(4.08);
        assert_eq!(session.tap_lane(0, 4.08), Some(HitAccuracy::Good));
        assert!(!session.tiles()[0].is_hit);
        assert!(session.tiles()[1].is_hit);
    }
}
