//! Offline beat detection.
//!
//! The pipeline runs once per track over the fully decoded mono buffer:
//! 1. [`emphasis`] weights kick-like low end over broadband transients
//! 2. [`energy`] reduces the result to 20 ms blocks
//! 3. [`peaks`] picks adaptive-threshold local maxima
//! 4. [`post`] spaces, lanes and tiers the candidates into a [`BeatMap`]
//!
//! Steps 1-3 are deterministic; lane choice is the only randomized output and
//! draws from the injected generator.

pub mod emphasis;
pub mod energy;
pub mod peaks;
pub mod post;

pub use post::DifficultyPolicy;

use crate::models::{Beat, BeatMap};
use rand::Rng;
use std::time::Instant;

/// Runs the detection pipeline with a fixed tiering policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeatDetector {
    policy: DifficultyPolicy,
}

impl BeatDetector {
    pub fn new(policy: DifficultyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DifficultyPolicy {
        self.policy
    }

    /// Unfiltered, lane-less onset candidates.
    pub fn candidates(samples: &[f32], sample_rate: u32) -> Vec<Beat> {
        let emphasized = emphasis::emphasize(samples, sample_rate);
        let energies = energy::frame_energies(&emphasized, sample_rate);
        peaks::pick_peaks(&energies)
    }

    pub fn detect<R: Rng + ?Sized>(&self, samples: &[f32], sample_rate: u32, rng: &mut R) -> BeatMap {
        self.detect_cancellable(samples, sample_rate, rng, || false)
            .unwrap_or_default()
    }

    /// Like [`detect`](Self::detect), but polls `is_cancelled` between stages
    /// and gives up with `None` as soon as it reports true.
    pub fn detect_cancellable<R, F>(
        &self,
        samples: &[f32],
        sample_rate: u32,
        rng: &mut R,
        is_cancelled: F,
    ) -> Option<BeatMap>
    where
        R: Rng + ?Sized,
        F: Fn() -> bool,
    {
        let started = Instant::now();

        let emphasized = emphasis::emphasize(samples, sample_rate);
        if is_cancelled() {
            return None;
        }

        let energies = energy::frame_energies(&emphasized, sample_rate);
        drop(emphasized);
        if is_cancelled() {
            return None;
        }

        let raw = peaks::pick_peaks(&energies);
        if is_cancelled() {
            return None;
        }

        let candidates = raw.len();
        let map = post::build_beat_map(raw, rng, self.policy);
        log::debug!(
            "ANALYSIS: {} samples @ {} Hz -> {} blocks, {} candidates, {} beats in {:.1?}",
            samples.len(),
            sample_rate,
            energies.len(),
            candidates,
            map.beats(crate::models::Difficulty::Medium).len(),
            started.elapsed()
        );
        Some(map)
    }
}
