use serde::Serialize;

use crate::playback::TransportState;

/// Music state as shown to the performer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicStatus {
    Stopped,
    Playing,
    Paused,
}

impl From<TransportState> for MusicStatus {
    fn from(state: TransportState) -> Self {
        match state {
            TransportState::Idle => MusicStatus::Stopped,
            TransportState::Playing => MusicStatus::Playing,
            TransportState::Pausing | TransportState::Paused => MusicStatus::Paused,
        }
    }
}

/// Transport change decided by the control loop on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportAction {
    AutoPaused,
    AutoResumed,
}

/// Outcome of one [`ControlLoop::step`](super::ControlLoop::step).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepReport {
    pub bpm: Option<f64>,
    /// Rate requested from playback on this frame.
    pub rate: f64,
    /// Gesture value in `[0, 1]`, if both hands were visible.
    pub volume: Option<f64>,
    pub music_status: MusicStatus,
    pub action: Option<TransportAction>,
    pub volume_enabled: bool,
    pub tempo_enabled: bool,
    /// Volume control is on and no gesture arrived within the timeout.
    pub auto_paused: bool,
}
