//! Turns raw peak candidates into a playable beat map.

use crate::models::{Beat, BeatMap, MIN_BEAT_INTERVAL, NUM_LANES};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the three tiers are derived from the detected sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DifficultyPolicy {
    /// Every tier is the detected sequence.
    #[default]
    Collapsed,
    /// `easy` keeps only the loudest `easy_keep` fraction of beats;
    /// `medium` and `hard` are the detected sequence.
    IntensityThinned { easy_keep: f32 },
}

/// Greedy minimum-spacing filter over time-sorted beats.
pub fn enforce_min_interval(mut beats: Vec<Beat>) -> Vec<Beat> {
    beats.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut last_time = f64::NEG_INFINITY;
    beats.retain(|beat| {
        if beat.time - last_time >= MIN_BEAT_INTERVAL {
            last_time = beat.time;
            true
        } else {
            false
        }
    });
    beats
}

/// Random lanes with a soft bias against repeating the previous lane.
pub fn assign_lanes<R: Rng + ?Sized>(beats: &mut [Beat], rng: &mut R) {
    let mut previous: Option<u8> = None;
    for beat in beats.iter_mut() {
        let mut lane = rng.random_range(0..NUM_LANES as u8);
        if previous == Some(lane) && rng.random_bool(0.5) {
            lane = (lane + 1) % NUM_LANES as u8;
        }
        beat.lane = lane;
        previous = Some(lane);
    }
}

/// Loudest `keep` fraction of `beats`, in their original order.
fn thin_by_intensity(beats: &[Beat], keep: f32) -> Vec<Beat> {
    if beats.is_empty() || keep >= 1.0 {
        return beats.to_vec();
    }
    let count = ((beats.len() as f32 * keep.max(0.0)).ceil() as usize).clamp(1, beats.len());

    let mut intensities: Vec<f32> = beats.iter().map(|b| b.intensity).collect();
    intensities.sort_by(|a, b| b.total_cmp(a));
    let floor = intensities[count - 1];

    beats.iter().filter(|b| b.intensity >= floor).copied().collect()
}

/// Sort, space, lane and tier the raw candidates.
pub fn build_beat_map<R: Rng + ?Sized>(
    raw: Vec<Beat>,
    rng: &mut R,
    policy: DifficultyPolicy,
) -> BeatMap {
    let mut beats = enforce_min_interval(raw);
    assign_lanes(&mut beats, rng);

    match policy {
        DifficultyPolicy::Collapsed => BeatMap::new(beats.clone(), beats.clone(), beats),
        DifficultyPolicy::IntensityThinned { easy_keep } => {
            let easy = thin_by_intensity(&beats, easy_keep);
            BeatMap::new(easy, beats.clone(), beats)
        }
    }
}
