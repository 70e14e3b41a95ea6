//! On-screen tiles and the scroll geometry they move along.

use super::beat::Beat;

/// Seconds between a tile's spawn and its beat.
pub const LEAD_TIME: f64 = 2.0;

/// Normalized position of the tap zone.
pub const TAP_ZONE_POSITION: f64 = 0.92;

/// Tiles past this position are off screen and retired.
pub const RETIRE_POSITION: f64 = 1.2;

/// A beat travelling towards the tap zone.
#[derive(Debug, Clone, PartialEq)]
pub struct GameTile {
    pub beat: Beat,
    /// 0.0 at spawn, [`TAP_ZONE_POSITION`] on the beat.
    pub position: f64,
    pub is_hit: bool,
    pub is_missed: bool,
}

impl GameTile {
    pub fn new(beat: Beat) -> Self {
        Self {
            beat,
            position: 0.0,
            is_hit: false,
            is_missed: false,
        }
    }

    /// Music time at which the tile appears.
    pub fn spawn_time(beat: &Beat) -> f64 {
        beat.time - LEAD_TIME
    }

    /// Position as a pure function of elapsed music time.
    pub fn position_at(beat: &Beat, elapsed: f64) -> f64 {
        let progress = (elapsed - Self::spawn_time(beat)) / LEAD_TIME;
        (progress * TAP_ZONE_POSITION).max(0.0)
    }

    pub fn is_judged(&self) -> bool {
        self.is_hit || self.is_missed
    }

    pub fn lane(&self) -> u8 {
        self.beat.lane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_reaches_tap_zone_on_its_beat() {
        let beat = Beat::new(5.0, 2, 0.4);
        assert_eq!(GameTile::position_at(&beat, 3.0), 0.0);
        assert!((GameTile::position_at(&beat, 4.0) - 0.46).abs() < 1e-12);
        assert!((GameTile::position_at(&beat, 5.0) - TAP_ZONE_POSITION).abs() < 1e-12);
        assert!(GameTile::position_at(&beat, 5.7) > RETIRE_POSITION);
    }
}
