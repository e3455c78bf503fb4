//! Playback backends and the fade engine that drives them.

pub mod backend;
pub mod memory;
pub mod ramp;
#[cfg(feature = "rodio-backend")]
pub mod rodio_backend;

pub use backend::PlaybackBackend;
pub use memory::{BackendCall, MemoryBackend};
pub use ramp::{PlaybackRamp, RampSnapshot, TransportState};
#[cfg(feature = "rodio-backend")]
pub use rodio_backend::{RodioBackend, RodioOutput};
