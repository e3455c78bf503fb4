//! # Conductor Library
//!
//! Turns tracked hand positions into music playback control. The right hand
//! conducts the tempo, the distance between both hands shapes the volume, and
//! the music pauses itself when the performer stops conducting.
//!
//! The host drives a [`control::ControlLoop`] once per camera frame. Audio
//! output sits behind [`playback::PlaybackBackend`]; every level change is
//! faded by a [`playback::PlaybackRamp`] so the music never clicks.

pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod gesture;
pub mod media;
pub mod playback;
pub mod tempo;

pub use config::ControlConfig;
pub use control::{ControlLoop, MusicStatus, StepReport, TransportAction};
pub use gesture::{HandFrame, HandPoint};
