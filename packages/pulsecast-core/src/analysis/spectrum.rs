//! Windowed spectral analysis and beat detection.

use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};

use crate::protocol_constants::{
    BASELINE_LEN, BASELINE_MIN_FOR_BEAT, BASS_BINS, BEAT_SENSITIVITY, MID_BINS, TREBLE_BINS,
    WINDOW_SAMPLES,
};

/// One analysis frame produced from a single window. Ephemeral: never
/// queued, consumed immediately by the show engine's worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub rms: f32,
    pub beat: bool,
}

/// Transforms windows into frames, carrying the rolling bass baseline
/// between calls. Pure given that baseline: same window + same baseline
/// state always produces the same frame.
pub struct Analyzer {
    fft: Arc<dyn Fft<f32>>,
    baseline: VecDeque<f32>,
}

impl Analyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            fft: planner.plan_fft_forward(WINDOW_SAMPLES),
            baseline: VecDeque::with_capacity(BASELINE_LEN),
        }
    }

    /// Computes a frame from one mono, normalized window of exactly
    /// [`WINDOW_SAMPLES`] samples, and updates the bass baseline.
    pub fn analyze(&mut self, samples: &[f32]) -> Frame {
        debug_assert_eq!(samples.len(), WINDOW_SAMPLES);

        let mut buf: Vec<Complex32> = samples.iter().map(|&s| Complex32::new(s, 0.0)).collect();
        self.fft.process(&mut buf);

        let half = buf.len() / 2;
        let magnitudes: Vec<f32> = buf[..=half].iter().map(|c| c.norm()).collect();

        let bass = band_mean(&magnitudes, BASS_BINS, half);
        let mid = band_mean(&magnitudes, MID_BINS, half);
        let treble = band_mean(&magnitudes, TREBLE_BINS, half);

        let rms = {
            let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
            (sum_sq / samples.len() as f32).sqrt()
        };

        self.baseline.push_back(bass);
        if self.baseline.len() > BASELINE_LEN {
            self.baseline.pop_front();
        }

        let mean = self.baseline.iter().sum::<f32>() / self.baseline.len() as f32;
        let beat = bass > BEAT_SENSITIVITY * mean && self.baseline.len() >= BASELINE_MIN_FOR_BEAT;

        Frame { bass, mid, treble, rms, beat }
    }

    /// Current length of the rolling bass baseline, exposed for testing the
    /// "at most 40, purely FIFO" invariant.
    pub fn baseline_len(&self) -> usize {
        self.baseline.len()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic mean of magnitudes over `[lo, hi)`, clamped to `[0, half]`.
/// If `lo` is already out of range, the band value is 0 (step 2).
fn band_mean(magnitudes: &[f32], (lo, hi): (usize, usize), half: usize) -> f32 {
    if lo > half {
        return 0.0;
    }
    let hi = hi.min(half + 1).min(magnitudes.len());
    if lo >= hi {
        return 0.0;
    }
    let slice = &magnitudes[lo..hi];
    slice.iter().sum::<f32>() / slice.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol_constants::SAMPLE_RATE_HZ;

    fn silent_window() -> Vec<f32> {
        vec![0.0; WINDOW_SAMPLES]
    }

    fn sine_window(freq_hz: f32, amplitude: f32) -> Vec<f32> {
        (0..WINDOW_SAMPLES)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE_HZ as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq_hz * t).sin()
            })
            .collect()
    }

    #[test]
    fn silence_yields_zero_bands_and_no_beat() {
        let mut analyzer = Analyzer::new();
        let frame = analyzer.analyze(&silent_window());
        assert_eq!(frame.rms, 0.0);
        assert!(!frame.beat);
    }

    #[test]
    fn baseline_never_exceeds_cap_and_is_fifo() {
        let mut analyzer = Analyzer::new();
        for _ in 0..(BASELINE_LEN + 20) {
            analyzer.analyze(&silent_window());
        }
        assert_eq!(analyzer.baseline_len(), BASELINE_LEN);
    }

    #[test]
    fn beat_does_not_fire_before_minimum_baseline_length() {
        let mut analyzer = Analyzer::new();
        // A single loud window can't exceed 1.4x its own mean (mean == itself
        // with baseline len 1), and even if it could, len < 5 suppresses it.
        let frame = analyzer.analyze(&sine_window(100.0, 0.9));
        assert!(!frame.beat);
    }

    #[test]
    fn loud_bass_after_quiet_baseline_triggers_beat() {
        let mut analyzer = Analyzer::new();
        for _ in 0..10 {
            analyzer.analyze(&silent_window());
        }
        // A 100Hz sine falls in the bass band and should spike well above a
        // near-zero baseline mean.
        let frame = analyzer.analyze(&sine_window(100.0, 0.9));
        assert!(frame.bass > 0.0);
        assert!(frame.beat);
    }

    #[test]
    fn band_mean_returns_zero_when_lower_bin_out_of_range() {
        let magnitudes = vec![1.0; 10];
        assert_eq!(band_mean(&magnitudes, (50, 60), 20), 0.0);
    }
}
