//! Gesture signals derived from tracked hand positions.

pub mod beat;
pub mod hands;
pub mod volume;

pub use beat::BeatDetector;
pub use hands::{Hand, HandFrame, HandPoint};
pub use volume::VolumeMapper;
