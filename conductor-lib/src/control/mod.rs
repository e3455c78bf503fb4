//! Per-frame orchestration of gesture signals into playback commands.
//!
//! A [`ControlLoop`] is driven by the host once per tracked frame. It feeds
//! the right hand into the beat detector, maps the tempo estimate to a
//! playback rate, maps the distance between both hands to an expressive
//! volume and decides when the music auto-pauses or auto-resumes.
//!
//! The loop never blocks on audio: every volume change and every pause goes
//! through the [`PlaybackRamp`], which fades on its own threads.

mod report;

pub use report::{MusicStatus, StepReport, TransportAction};

use log::{debug, info};

use crate::config::{ControlConfig, LoopConfig};
use crate::gesture::{BeatDetector, HandFrame, VolumeMapper};
use crate::playback::{PlaybackRamp, TransportState};
use crate::tempo::TempoMapper;

/// Gesture-to-playback controller for one music session.
pub struct ControlLoop {
    config: LoopConfig,
    beat: BeatDetector,
    tempo: TempoMapper,
    volume: VolumeMapper,
    playback: PlaybackRamp,
    volume_enabled: bool,
    tempo_enabled: bool,
    /// Time of the last frame with a volume gesture. `None` counts as timed out.
    last_volume_time: Option<f64>,
    /// Set when volume control is turned on; the next frame restarts the
    /// timeout clock.
    restart_volume_clock: bool,
}

impl ControlLoop {
    pub fn new(config: &ControlConfig, playback: PlaybackRamp) -> Self {
        Self {
            config: config.control,
            beat: BeatDetector::new(config.beat),
            tempo: TempoMapper::new(config.tempo),
            volume: VolumeMapper::new(&config.volume),
            playback,
            volume_enabled: config.control.volume_enabled,
            tempo_enabled: config.control.tempo_enabled,
            last_volume_time: None,
            restart_volume_clock: false,
        }
    }

    /// Process one frame observed at `now` (seconds, monotonic).
    pub fn step(&mut self, frame: &HandFrame, now: f64) -> StepReport {
        let bpm = match frame.right {
            Some(right) => self.beat.update(right.y, now),
            None => {
                self.beat.lose_track();
                self.beat.bpm()
            }
        };

        // The mapper keeps filtering while tempo control is off, so turning
        // it back on resumes from a live estimate.
        let live_rate = self.tempo.compute_rate(bpm, now);
        let rate = if self.tempo_enabled {
            live_rate
        } else {
            self.config.default_rate
        };
        self.playback.set_rate(rate);

        let volume = self.volume.compute(frame.left, frame.right);
        let mut action = None;

        if std::mem::take(&mut self.restart_volume_clock) && self.volume_enabled {
            self.last_volume_time = Some(now);
        }

        if self.volume_enabled {
            match volume {
                Some(gesture) => {
                    self.last_volume_time = Some(now);
                    if self.playback.transport() != TransportState::Playing {
                        info!("volume gesture at {:.2}s, resuming", now);
                        self.playback.play();
                        action = Some(TransportAction::AutoResumed);
                    }
                    self.playback.set_expressive_volume(gesture);
                }
                None => {
                    if self.timed_out(now) && self.playback.transport() == TransportState::Playing
                    {
                        info!("no volume gesture for {:.1}s, pausing", self.config.volume_timeout);
                        self.playback.pause();
                        action = Some(TransportAction::AutoPaused);
                    }
                }
            }
        } else {
            if self.playback.transport() != TransportState::Playing {
                self.playback.play();
                action = Some(TransportAction::AutoResumed);
            }
            self.playback.ramp_to(self.config.default_volume as i32);
        }

        let report = StepReport {
            bpm,
            rate,
            volume,
            music_status: self.playback.transport().into(),
            action,
            volume_enabled: self.volume_enabled,
            tempo_enabled: self.tempo_enabled,
            auto_paused: self.volume_enabled && self.timed_out(now),
        };
        debug!("step {:.3}: {:?}", now, report);
        report
    }

    fn timed_out(&self, now: f64) -> bool {
        match self.last_volume_time {
            Some(last) => now - last > self.config.volume_timeout,
            None => true,
        }
    }

    /// Turn gesture volume control on or off. Either way the level snaps to
    /// the default volume; turning it off also resumes paused music. Turning
    /// it on grants a full `volume_timeout` before the music auto-pauses.
    pub fn set_volume_control(&mut self, enabled: bool) {
        if self.volume_enabled == enabled {
            return;
        }
        info!("volume control {}", if enabled { "on" } else { "off" });
        self.volume_enabled = enabled;
        self.restart_volume_clock = enabled;
        if !enabled
            && matches!(
                self.playback.transport(),
                TransportState::Pausing | TransportState::Paused
            )
        {
            self.playback.play();
        }
        self.playback.ramp_to(self.config.default_volume as i32);
    }

    /// Turn tempo control on or off. Either way the rate snaps to the
    /// default; live rates return on the next frame when turned on.
    pub fn set_tempo_control(&mut self, enabled: bool) {
        if self.tempo_enabled == enabled {
            return;
        }
        info!("tempo control {}", if enabled { "on" } else { "off" });
        self.tempo_enabled = enabled;
        self.playback.set_rate(self.config.default_rate);
    }

    /// Flip volume control; returns the new state.
    pub fn toggle_volume_control(&mut self) -> bool {
        self.set_volume_control(!self.volume_enabled);
        self.volume_enabled
    }

    /// Flip tempo control; returns the new state.
    pub fn toggle_tempo_control(&mut self) -> bool {
        self.set_tempo_control(!self.tempo_enabled);
        self.tempo_enabled
    }

    pub fn volume_enabled(&self) -> bool {
        self.volume_enabled
    }

    pub fn tempo_enabled(&self) -> bool {
        self.tempo_enabled
    }

    pub fn playback(&self) -> &PlaybackRamp {
        &self.playback
    }

    /// Stop the playback worker threads.
    pub fn shutdown(&self) {
        self.playback.shutdown();
    }
}
