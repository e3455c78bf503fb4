//! Downbeat detection from a single hand's vertical motion.
//!
//! The detector looks at per-frame vertical velocity of one wrist (screen
//! coordinates, so positive velocity is downward). A sharp downward stroke is
//! a downbeat; the interval between two downbeats becomes a BPM sample that is
//! folded into an exponential moving average.

use crate::config::BeatConfig;

/// Stateful vertical-velocity beat detector.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    config: BeatConfig,
    last_y: Option<f64>,
    last_downbeat_time: Option<f64>,
    ema_bpm: Option<f64>,
}

impl BeatDetector {
    pub fn new(config: BeatConfig) -> Self {
        debug_assert!(config.min_interval > 0.0);
        debug_assert!(config.min_bpm < config.max_bpm);
        Self {
            config,
            last_y: None,
            last_downbeat_time: None,
            ema_bpm: None,
        }
    }

    /// Feed one vertical position sample taken at `now` (seconds).
    ///
    /// Returns the current smoothed BPM estimate, which stays `None` until two
    /// downbeats have been seen.
    pub fn update(&mut self, y: f64, now: f64) -> Option<f64> {
        let last_y = match self.last_y.replace(y) {
            Some(last_y) => last_y,
            None => return self.ema_bpm,
        };

        let velocity = y - last_y;

        // Fast upward flick: not a stroke, and not a reason to forget anything.
        if velocity < self.config.reverse_velocity_limit {
            return self.ema_bpm;
        }

        if velocity > self.config.velocity_threshold {
            self.register_downbeat(now);
        }

        self.ema_bpm
    }

    fn register_downbeat(&mut self, now: f64) {
        if let Some(last) = self.last_downbeat_time {
            let interval = now - last;
            if interval < self.config.min_interval {
                return;
            }

            let bpm = (60.0 / interval).clamp(self.config.min_bpm, self.config.max_bpm);
            let alpha = self.config.alpha;
            self.ema_bpm = Some(match self.ema_bpm {
                Some(ema) => alpha * bpm + (1.0 - alpha) * ema,
                None => bpm,
            });
        }

        self.last_downbeat_time = Some(now);
    }

    /// Current smoothed BPM estimate.
    pub fn bpm(&self) -> Option<f64> {
        self.ema_bpm
    }

    /// Time of the last counted downbeat.
    pub fn last_downbeat_time(&self) -> Option<f64> {
        self.last_downbeat_time
    }

    /// Forget the last position after the hand left the frame, so the next
    /// sample does not produce a velocity spike across the gap. The tempo
    /// estimate and downbeat timing are kept.
    pub fn lose_track(&mut self) {
        self.last_y = None;
    }

    /// Clear all state.
    pub fn reset(&mut self) {
        self.last_y = None;
        self.last_downbeat_time = None;
        self.ema_bpm = None;
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(BeatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive one down stroke per beat: rest at y=100, jump to y=120 on the beat.
    fn conduct(detector: &mut BeatDetector, beat_times: &[f64]) -> Option<f64> {
        let mut bpm = None;
        for &t in beat_times {
            detector.update(100.0, t - 0.05);
            bpm = detector.update(120.0, t);
        }
        bpm
    }

    #[test]
    fn first_call_returns_none() {
        let mut detector = BeatDetector::default();
        assert_eq!(detector.update(100.0, 0.0), None);
        assert_eq!(detector.last_downbeat_time(), None);
    }

    #[test]
    fn first_downbeat_seeds_interval_without_estimate() {
        let mut detector = BeatDetector::default();
        assert_eq!(conduct(&mut detector, &[1.0]), None);
        assert_eq!(detector.last_downbeat_time(), Some(1.0));
    }

    #[test]
    fn steady_strokes_converge_on_tempo() {
        let mut detector = BeatDetector::default();
        let beats: Vec<f64> = (1..=12).map(|i| i as f64 * 0.5).collect();
        let bpm = conduct(&mut detector, &beats).expect("bpm after several beats");
        assert!((bpm - 120.0).abs() < 1e-9, "bpm was {}", bpm);
    }

    #[test]
    fn ema_folds_new_samples_with_alpha() {
        let mut detector = BeatDetector::default();
        conduct(&mut detector, &[1.0, 2.0]);
        assert_eq!(detector.bpm(), Some(60.0));
        conduct(&mut detector, &[2.5]);
        // 0.25 * 120 + 0.75 * 60
        let bpm = detector.bpm().expect("bpm");
        assert!((bpm - 75.0).abs() < 1e-9);
    }

    #[test]
    fn refractory_period_counts_one_beat() {
        let mut detector = BeatDetector::default();
        detector.update(100.0, 0.0);
        detector.update(110.0, 1.0);
        // Second qualifying stroke 0.1 s later is discarded.
        detector.update(120.0, 1.1);
        assert_eq!(detector.last_downbeat_time(), Some(1.0));
        assert_eq!(detector.bpm(), None);

        detector.update(100.0, 1.4);
        detector.update(110.0, 1.5);
        assert_eq!(detector.last_downbeat_time(), Some(1.5));
        assert_eq!(detector.bpm(), Some(120.0));
    }

    #[test]
    fn upward_flick_is_ignored() {
        let mut detector = BeatDetector::default();
        conduct(&mut detector, &[1.0, 2.0]);
        let before = detector.bpm();
        detector.update(50.0, 2.1);
        assert_eq!(detector.bpm(), before);
        assert_eq!(detector.last_downbeat_time(), Some(2.0));
    }

    #[test]
    fn slow_drift_is_not_a_beat() {
        let mut detector = BeatDetector::default();
        for i in 0..50 {
            detector.update(100.0 + i as f64 * 2.0, i as f64 * 0.1);
        }
        assert_eq!(detector.last_downbeat_time(), None);
    }

    #[test]
    fn estimate_stays_within_bpm_bounds() {
        let mut detector = BeatDetector::default();
        // Very slow strokes clamp to the floor.
        conduct(&mut detector, &[0.0, 10.0, 20.0]);
        assert_eq!(detector.bpm(), Some(40.0));

        // Strokes right at the refractory limit clamp to the ceiling.
        let mut detector = BeatDetector::default();
        let beats: Vec<f64> = (0..40).map(|i| i as f64 * 0.25).collect();
        conduct(&mut detector, &beats);
        let bpm = detector.bpm().expect("bpm");
        assert!((40.0..=200.0).contains(&bpm));
    }

    #[test]
    fn noisy_sequence_keeps_estimate_bounded() {
        let mut detector = BeatDetector::default();
        let mut y = 300.0;
        for i in 0..2_000 {
            // Deterministic pseudo-noise: mixed strokes, flicks and drift.
            let step = ((i * 7919) % 41) as f64 - 18.0;
            y += step;
            let t = i as f64 * 0.016 + ((i * 31) % 5) as f64 * 0.001;
            if let Some(bpm) = detector.update(y, t) {
                assert!((40.0..=200.0).contains(&bpm), "bpm {} out of range", bpm);
            }
        }
    }

    #[test]
    fn lose_track_suppresses_spike_across_gap() {
        let mut detector = BeatDetector::default();
        detector.update(100.0, 0.0);
        detector.lose_track();
        // Hand reappears far lower: treated as a first sample.
        detector.update(400.0, 1.0);
        assert_eq!(detector.last_downbeat_time(), None);
    }

    #[test]
    fn reset_clears_estimate() {
        let mut detector = BeatDetector::default();
        conduct(&mut detector, &[1.0, 2.0]);
        detector.reset();
        assert_eq!(detector.bpm(), None);
        assert_eq!(detector.last_downbeat_time(), None);
    }
}
