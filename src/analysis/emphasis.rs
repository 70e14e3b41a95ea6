//! Onset emphasis: a one-pole low-pass split that favours kick-like content.

use std::f64::consts::PI;

/// Low-pass cutoff separating kicks from broadband transients (Hz).
pub const CUTOFF_HZ: f64 = 150.0;
/// Weight of the low band in the emphasized signal.
pub const LOW_WEIGHT: f32 = 1.2;
/// Weight of the residual high band.
pub const HIGH_WEIGHT: f32 = 0.8;

/// Smoothing coefficient of the one-pole filter for `sample_rate`.
pub fn lowpass_alpha(sample_rate: u32) -> f64 {
    let dt = 1.0 / sample_rate.max(1) as f64;
    let rc = 1.0 / (2.0 * PI * CUTOFF_HZ);
    dt / (rc + dt)
}

/// Rectified, band-weighted copy of `samples`.
///
/// `out[n] = |lp[n]| * 1.2 + |x[n] - lp[n]| * 0.8`, with the filter state
/// starting at zero.
pub fn emphasize(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    let alpha = lowpass_alpha(sample_rate);
    let mut lowpass = 0.0f64;

    samples
        .iter()
        .map(|&x| {
            let x = x as f64;
            lowpass += alpha * (x - lowpass);
            let high = x - lowpass;
            (lowpass.abs() as f32) * LOW_WEIGHT + (high.abs() as f32) * HIGH_WEIGHT
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_stays_silent() {
        assert!(emphasize(&[0.0; 512], 44_100).iter().all(|&s| s == 0.0));
        assert!(emphasize(&[], 44_100).is_empty());
    }

    #[test]
    fn dc_settles_into_the_low_band() {
        let out = emphasize(&vec![0.5; 44_100], 44_100);
        // Filter converges within a few milliseconds; the tail is all low band.
        let tail = *out.last().unwrap();
        assert!((tail - 0.5 * LOW_WEIGHT).abs() < 1e-4);
        // The very first sample is mostly residual high content.
        assert!(out[0] < tail);
    }

    #[test]
    fn low_tones_outweigh_high_tones() {
        let sr = 44_100;
        let tone = |freq: f64| -> Vec<f32> {
            (0..sr as usize)
                .map(|n| (2.0 * PI * freq * n as f64 / sr as f64).sin() as f32)
                .collect()
        };
        let mean = |v: &[f32]| v.iter().sum::<f32>() / v.len() as f32;
        let low = mean(&emphasize(&tone(50.0), sr));
        let high = mean(&emphasize(&tone(5_000.0), sr));
        assert!(low > high);
    }

    #[test]
    fn alpha_grows_as_sample_rate_drops() {
        assert!(lowpass_alpha(8_000) > lowpass_alpha(48_000));
        assert!(lowpass_alpha(44_100) > 0.0 && lowpass_alpha(44_100) < 1.0);
    }
}
