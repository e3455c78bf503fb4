//! Error types for configuration loading, media probing and backend calls.
//!
//! None of these surface from the per-frame control path. They are returned
//! by setup code (config, media, backend construction) and by the backend
//! methods that a playback ramp deliberately absorbs.

use std::fmt::{Display, Formatter};

/// Error type for loading and validating a [`crate::config::ControlConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Json(err) => write!(f, "config parse error: {}", err),
            Self::Invalid(err) => write!(f, "invalid config: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Failure reported by a [`crate::playback::PlaybackBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the request in its current state (e.g. a rate
    /// change while paused).
    Rejected(String),
    /// The media could not be opened or decoded.
    Media(String),
    /// The output device or stream is not available.
    Unavailable(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "backend rejected request: {}", err),
            Self::Media(err) => write!(f, "media error: {}", err),
            Self::Unavailable(err) => write!(f, "backend unavailable: {}", err),
        }
    }
}

impl std::error::Error for BackendError {}

/// Error type for probing loop media.
#[derive(Debug)]
pub enum MediaError {
    Io(std::io::Error),
    Probe(String),
    NoAudioTrack,
}

impl Display for MediaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Probe(err) => write!(f, "probe error: {}", err),
            Self::NoAudioTrack => write!(f, "no decodable audio track"),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<MediaError> for BackendError {
    fn from(value: MediaError) -> Self {
        Self::Media(value.to_string())
    }
}
