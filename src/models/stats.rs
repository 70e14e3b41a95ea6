//! Hit statistics and accuracy types.
//!
//! This module defines the judgement scale used for scoring, including
//! per-accuracy counters and the accuracy percentage shown on results.

use serde::{Deserialize, Serialize};

/// Outcome of a judged tile, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitAccuracy {
    Perfect,
    Good,
    Miss,
}

impl HitAccuracy {
    /// Base points before the combo multiplier.
    pub fn points(self) -> u32 {
        match self {
            HitAccuracy::Perfect => 100,
            HitAccuracy::Good => 50,
            HitAccuracy::Miss => 0,
        }
    }
}

/// Accumulated hit statistics for a play session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitStats {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
}

impl HitStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, accuracy: HitAccuracy) {
        match accuracy {
            HitAccuracy::Perfect => self.perfect += 1,
            HitAccuracy::Good => self.good += 1,
            HitAccuracy::Miss => self.miss += 1,
        }
    }

    pub fn judged(&self) -> u32 {
        self.perfect + self.good + self.miss
    }

    /// Calculates accuracy percentage (0-100).
    ///
    /// Perfect weighs 100%, Good 50%, Miss 0%.
    pub fn calculate_accuracy(&self) -> f64 {
        let total = self.judged() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let score = self.perfect as f64 * 2.0 + self.good as f64;
        (score / (total * 2.0)) * 100.0
    }
}
