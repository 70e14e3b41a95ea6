//! Beats, difficulty tiers and the per-track beat map.

use serde::{Deserialize, Serialize};

/// Number of tap lanes.
pub const NUM_LANES: usize = 4;

/// Minimum spacing between two consecutive beats of a tier (seconds).
pub const MIN_BEAT_INTERVAL: f64 = 0.15;

/// A detected rhythmic onset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// Seconds from the start of the track.
    pub time: f64,
    /// Lane in `0..NUM_LANES`.
    pub lane: u8,
    /// Block energy at the onset.
    pub intensity: f32,
}

impl Beat {
    pub fn new(time: f64, lane: u8, intensity: f32) -> Self {
        Self {
            time,
            lane,
            intensity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Every tier of a track's chart.
///
/// Each sequence is time-ascending with at least [`MIN_BEAT_INTERVAL`] between
/// neighbours. A map is built once per track and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BeatMap {
    easy: Vec<Beat>,
    medium: Vec<Beat>,
    hard: Vec<Beat>,
}

impl BeatMap {
    pub fn new(easy: Vec<Beat>, medium: Vec<Beat>, hard: Vec<Beat>) -> Self {
        Self { easy, medium, hard }
    }

    pub fn beats(&self, difficulty: Difficulty) -> &[Beat] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    /// Time of the last beat across every tier.
    pub fn last_beat_time(&self) -> Option<f64> {
        Difficulty::ALL
            .iter()
            .filter_map(|d| self.beats(*d).last())
            .map(|b| b.time)
            .reduce(f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.easy.is_empty() && self.medium.is_empty() && self.hard.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beats_are_looked_up_per_tier() {
        let map = BeatMap::new(
            vec![Beat::new(1.0, 0, 0.5)],
            vec![Beat::new(1.0, 0, 0.5), Beat::new(2.0, 1, 0.3)],
            vec![],
        );
        assert_eq!(map.beats(Difficulty::Easy).len(), 1);
        assert_eq!(map.beats(Difficulty::Medium).len(), 2);
        assert!(map.beats(Difficulty::Hard).is_empty());
        assert_eq!(map.last_beat_time(), Some(2.0));
        assert!(!map.is_empty());
        assert_eq!(BeatMap::default().last_beat_time(), None);
    }

    #[test]
    fn difficulty_defaults_to_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        assert_eq!(Difficulty::Hard.name(), "hard");
    }
}
