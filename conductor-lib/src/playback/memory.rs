//! In-process backend that records every call.
//!
//! Used by tests and by dry runs of the CLI. It behaves like a strict media
//! player: rate changes are rejected while nothing is playing.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::BackendError;

use super::backend::PlaybackBackend;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Load { path: PathBuf, looping: bool },
    Play,
    Pause,
    Stop,
    SetVolume(u8),
    SetRate(f64),
    RejectedRate(f64),
    Reload,
}

#[derive(Debug, Default)]
struct MemoryState {
    path: Option<PathBuf>,
    playing: bool,
    volume: u8,
    rate: f64,
    calls: Vec<BackendCall>,
}

/// Recording [`PlaybackBackend`] with no audio output.
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                volume: 100,
                rate: 1.0,
                ..MemoryState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Volume levels pushed so far, in order.
    pub fn volume_history(&self) -> Vec<u8> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::SetVolume(volume) => Some(*volume),
                _ => None,
            })
            .collect()
    }

    pub fn volume(&self) -> u8 {
        self.lock().volume
    }

    pub fn rate(&self) -> f64 {
        self.lock().rate
    }

    pub fn count(&self, call: &BackendCall) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub fn pause_count(&self) -> usize {
        self.count(&BackendCall::Pause)
    }

    pub fn loaded_path(&self) -> Option<PathBuf> {
        self.lock().path.clone()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackBackend for MemoryBackend {
    fn load(&self, path: &Path, looping: bool) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.path = Some(path.to_path_buf());
        state.playing = false;
        state.calls.push(BackendCall::Load {
            path: path.to_path_buf(),
            looping,
        });
        Ok(())
    }

    fn play(&self) {
        let mut state = self.lock();
        state.playing = true;
        state.calls.push(BackendCall::Play);
    }

    fn pause(&self) {
        let mut state = self.lock();
        state.playing = false;
        state.calls.push(BackendCall::Pause);
    }

    fn stop(&self) {
        let mut state = self.lock();
        state.playing = false;
        state.calls.push(BackendCall::Stop);
    }

    fn set_volume(&self, volume: u8) {
        let mut state = self.lock();
        state.volume = volume.min(100);
        state.calls.push(BackendCall::SetVolume(volume));
    }

    fn set_rate(&self, rate: f64) -> Result<(), BackendError> {
        let mut state = self.lock();
        if !state.playing {
            state.calls.push(BackendCall::RejectedRate(rate));
            return Err(BackendError::Rejected(
                "rate change while not playing".to_string(),
            ));
        }
        state.rate = rate;
        state.calls.push(BackendCall::SetRate(rate));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn reload_looping_media(&self) -> Result<(), BackendError> {
        let mut state = self.lock();
        if state.path.is_none() {
            return Err(BackendError::Media("no media loaded".to_string()));
        }
        state.playing = false;
        state.calls.push(BackendCall::Reload);
        Ok(())
    }
}
