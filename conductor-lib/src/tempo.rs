//! BPM to playback-rate mapping.
//!
//! The upstream BPM estimate is noisy, so the mapped rate passes three
//! independent filters before it is committed: EMA smoothing, a deadband and
//! a throttle on how often the rate may change.

use crate::config::TempoConfig;

/// Converts a BPM estimate into a bounded, smoothed, rate-limited multiplier.
#[derive(Debug, Clone)]
pub struct TempoMapper {
    config: TempoConfig,
    last_rate: f64,
    last_applied_time: Option<f64>,
}

impl TempoMapper {
    pub fn new(config: TempoConfig) -> Self {
        debug_assert!(config.min_bpm < config.max_bpm);
        debug_assert!(config.min_rate <= config.max_rate);
        Self {
            last_rate: 1.0_f64.clamp(config.min_rate, config.max_rate),
            last_applied_time: None,
            config,
        }
    }

    /// Rate for the current frame. Returns the held-over rate when `bpm` is
    /// `None` or when a filter suppresses the change.
    pub fn compute_rate(&mut self, bpm: Option<f64>, now: f64) -> f64 {
        let bpm = match bpm {
            Some(bpm) => bpm,
            None => return self.last_rate,
        };

        let smoothed = self.config.smoothing * self.map_bpm(bpm)
            + (1.0 - self.config.smoothing) * self.last_rate;

        if (smoothed - self.last_rate).abs() < self.config.deadband {
            return self.last_rate;
        }

        if let Some(applied) = self.last_applied_time {
            if now - applied < self.config.update_interval {
                return self.last_rate;
            }
        }

        self.last_rate = smoothed;
        self.last_applied_time = Some(now);
        smoothed
    }

    /// Linear map of a clamped BPM onto the rate range.
    fn map_bpm(&self, bpm: f64) -> f64 {
        let TempoConfig {
            min_bpm,
            max_bpm,
            min_rate,
            max_rate,
            ..
        } = self.config;
        let t = (bpm.clamp(min_bpm, max_bpm) - min_bpm) / (max_bpm - min_bpm);
        min_rate + t * (max_rate - min_rate)
    }

    /// Last committed rate.
    pub fn last_rate(&self) -> f64 {
        self.last_rate
    }
}

impl Default for TempoMapper {
    fn default() -> Self {
        Self::new(TempoConfig::default())
    }
}
