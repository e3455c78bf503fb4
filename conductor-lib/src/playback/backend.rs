//! The audio backend the control core drives.

use std::path::Path;

use crate::error::BackendError;

/// Transport and level controls of an external audio player.
///
/// Methods take `&self` because the foreground frame loop, the ramp worker
/// and pause watchers all hold the same backend. Implementations handle their
/// own interior locking.
pub trait PlaybackBackend: Send + Sync {
    /// Load media, optionally looping it forever.
    fn load(&self, path: &Path, looping: bool) -> Result<(), BackendError>;

    fn play(&self);

    fn pause(&self);

    fn stop(&self);

    /// Set the output level, `0..=100`.
    fn set_volume(&self, volume: u8);

    /// Set the playback speed multiplier. Backends may reject this while
    /// paused.
    fn set_rate(&self, rate: f64) -> Result<(), BackendError>;

    fn is_playing(&self) -> bool;

    /// Drop the current media and load the last loaded path again, looping,
    /// positioned at the start.
    fn reload_looping_media(&self) -> Result<(), BackendError>;
}
