//! Tunables for the control core.
//!
//! A [`ControlConfig`] is built once at startup (defaults, or JSON from disk)
//! and each component takes its own section by value. Every section is
//! `#[serde(default)]`, so a partial JSON file only overrides what it names.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Beat detector thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatConfig {
    /// Refractory period between two counted downbeats (seconds).
    pub min_interval: f64,
    /// Minimum per-frame downward movement (pixels) for a candidate stroke.
    pub velocity_threshold: f64,
    /// Upward movement faster than this (negative pixels) is ignored.
    pub reverse_velocity_limit: f64,
    /// EMA smoothing factor applied to each new BPM sample.
    pub alpha: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            min_interval: 0.25,
            velocity_threshold: 4.0,
            reverse_velocity_limit: -6.0,
            alpha: 0.25,
            min_bpm: 40.0,
            max_bpm: 200.0,
        }
    }
}

/// BPM to playback-rate mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempoConfig {
    pub min_bpm: f64,
    pub max_bpm: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    /// Weight of the new rate in the smoothing step.
    pub smoothing: f64,
    pub deadband: f64,
    /// Minimum time between two committed rate changes (seconds).
    pub update_interval: f64,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            min_bpm: 80.0,
            max_bpm: 160.0,
            min_rate: 0.75,
            max_rate: 1.25,
            smoothing: 0.35,
            deadband: 0.002,
            update_interval: 0.15,
        }
    }
}

/// Inter-hand distance mapping and expressive volume range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Hands almost touching (pixels); maps to gesture 0.0.
    pub min_dist: f64,
    /// Arms stretched apart (pixels); maps to gesture 1.0.
    pub max_dist: f64,
    /// Backend volume at gesture multiplier 1.0.
    pub baseline: f64,
    /// Lowest volume a gesture alone can request.
    pub floor: u8,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            min_dist: 40.0,
            max_dist: 600.0,
            baseline: 70.0,
            floor: 35,
        }
    }
}

/// Fade engine timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampConfig {
    pub tick_ms: u64,
    /// Tick budget of a single ramp, in seconds.
    pub ramp_time: f64,
    /// Fraction of the remaining gap covered per tick.
    pub step_fraction: f64,
    /// Delay after the first backend `play()` before the rate is applied.
    pub settle_ms: u64,
    /// Volume at or below which a fade-out counts as silent.
    pub silence_threshold: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            tick_ms: 20,
            ramp_time: 1.0,
            step_fraction: 0.25,
            settle_ms: 100,
            silence_threshold: 1.0,
        }
    }
}

impl RampConfig {
    /// Number of ticks a single ramp may run before it snaps to the target.
    pub fn max_ticks(&self) -> u32 {
        let tick_secs = self.tick_ms.max(1) as f64 / 1000.0;
        ((self.ramp_time / tick_secs) as u32).max(1)
    }
}

/// Orchestration defaults for the per-frame control loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Seconds without a volume gesture before playback auto-pauses.
    pub volume_timeout: f64,
    pub default_rate: f64,
    pub default_volume: u8,
    pub volume_enabled: bool,
    pub tempo_enabled: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            volume_timeout: 2.0,
            default_rate: 1.0,
            default_volume: 70,
            volume_enabled: true,
            tempo_enabled: true,
        }
    }
}

/// Complete set of tunables for one music session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub beat: BeatConfig,
    pub tempo: TempoConfig,
    pub volume: VolumeConfig,
    pub ramp: RampConfig,
    pub control: LoopConfig,
}

impl ControlConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the construction-time preconditions of every component.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let beat = &self.beat;
        if beat.min_interval <= 0.0 {
            return Err(invalid("beat.min_interval must be positive"));
        }
        if beat.reverse_velocity_limit >= beat.velocity_threshold {
            return Err(invalid(
                "beat.reverse_velocity_limit must be below beat.velocity_threshold",
            ));
        }
        if !(0.0..=1.0).contains(&beat.alpha) {
            return Err(invalid("beat.alpha must be within [0, 1]"));
        }
        if beat.min_bpm <= 0.0 || beat.min_bpm >= beat.max_bpm {
            return Err(invalid("beat.min_bpm must be positive and below beat.max_bpm"));
        }

        let tempo = &self.tempo;
        if tempo.min_bpm >= tempo.max_bpm {
            return Err(invalid("tempo.min_bpm must be below tempo.max_bpm"));
        }
        if tempo.min_rate <= 0.0 || tempo.min_rate > tempo.max_rate {
            return Err(invalid("tempo rate bounds must satisfy 0 < min_rate <= max_rate"));
        }
        if !(0.0..=1.0).contains(&tempo.smoothing) {
            return Err(invalid("tempo.smoothing must be within [0, 1]"));
        }
        if tempo.deadband < 0.0 || tempo.update_interval < 0.0 {
            return Err(invalid("tempo.deadband and tempo.update_interval must not be negative"));
        }

        let volume = &self.volume;
        if volume.min_dist < 0.0 || volume.min_dist >= volume.max_dist {
            return Err(invalid("volume.min_dist must be below volume.max_dist"));
        }
        if volume.floor > 100 {
            return Err(invalid("volume.floor must be within [0, 100]"));
        }

        let ramp = &self.ramp;
        if ramp.tick_ms == 0 {
            return Err(invalid("ramp.tick_ms must be positive"));
        }
        if ramp.ramp_time <= 0.0 {
            return Err(invalid("ramp.ramp_time must be positive"));
        }
        if ramp.step_fraction <= 0.0 || ramp.step_fraction > 1.0 {
            return Err(invalid("ramp.step_fraction must be within (0, 1]"));
        }

        let control = &self.control;
        if control.volume_timeout < 0.0 {
            return Err(invalid("control.volume_timeout must not be negative"));
        }
        if control.default_volume > 100 {
            return Err(invalid("control.default_volume must be within [0, 100]"));
        }
        if !(0.5..=2.0).contains(&control.default_rate) {
            return Err(invalid("control.default_rate must be within [0.5, 2.0]"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}
