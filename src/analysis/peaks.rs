//! Adaptive-threshold peak picking over block energies.

use super::energy::BLOCK_SECONDS;
use crate::models::Beat;

/// Blocks of context required on each side of a candidate.
pub const WINDOW_SIZE: usize = 8;
/// A peak must exceed the local mean by this factor.
pub const THRESHOLD_MULTIPLIER: f32 = 1.3;
/// Absolute floor below which nothing is a beat.
pub const MIN_ENERGY: f32 = 0.05;

/// Scans `energies` for thresholded local maxima.
///
/// Candidates carry lane 0; lanes are assigned during post-processing.
pub fn pick_peaks(energies: &[f32]) -> Vec<Beat> {
    let len = energies.len();
    if len <= 2 * WINDOW_SIZE {
        return Vec::new();
    }

    let mut beats = Vec::new();
    for i in WINDOW_SIZE..len - WINDOW_SIZE {
        let energy = energies[i];
        if energy <= MIN_ENERGY {
            continue;
        }

        let window = &energies[i - WINDOW_SIZE..i + WINDOW_SIZE];
        let local_avg = window.iter().sum::<f32>() / window.len() as f32;

        if energy > local_avg * THRESHOLD_MULTIPLIER
            && energy >= energies[i - 1]
            && energy >= energies[i + 1]
        {
            beats.push(Beat::new(i as f64 * BLOCK_SECONDS, 0, energy));
        }
    }
    beats
}
