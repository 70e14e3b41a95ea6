//! Timing thresholds for judging taps.

use super::stats::HitAccuracy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitWindow {
    /// Seconds either side of the beat that still count as Perfect.
    pub perfect_s: f64,
    /// Seconds either side of the beat that still count as Good.
    /// Past this a tile can no longer be hit and is auto-missed.
    pub good_s: f64,
}

impl HitWindow {
    pub const fn new() -> Self {
        Self {
            perfect_s: 0.05,
            good_s: 0.10,
        }
    }

    /// Judges a signed timing offset in seconds.
    ///
    /// Returns `None` outside the good window: such taps are ignored, never
    /// punished.
    pub fn judge(&self, timing_diff_s: f64) -> Option<HitAccuracy> {
        let abs_diff = timing_diff_s.abs();
        if abs_diff <= self.perfect_s {
            Some(HitAccuracy::Perfect)
        } else if abs_diff <= self.good_s {
            Some(HitAccuracy::Good)
        } else {
            None
        }
    }

    /// Whether a beat at `beat_time` can no longer be hit at `elapsed`.
    pub fn is_late(&self, beat_time: f64, elapsed: f64) -> bool {
        elapsed > beat_time + self.good_s
    }
}

impl Default for HitWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn judge_is_symmetric() {
        let w = HitWindow::new();
        assert_eq!(w.judge(0.0), Some(HitAccuracy::Perfect));
        assert_eq!(w.judge(-0.04), Some(HitAccuracy::Perfect));
        assert_eq!(w.judge(0.07), Some(HitAccuracy::Good));
        assert_eq!(w.judge(-0.09), Some(HitAccuracy::Good));
        assert_eq!(w.judge(0.15), None);
        assert_eq!(w.judge(-0.2), None);
    }

    #[test]
    fn lateness_is_strict() {
        let w = HitWindow::new();
        assert!(!w.is_late(1.0, 1.05));
        assert!(w.is_late(1.0, 1.2));
    }
}
