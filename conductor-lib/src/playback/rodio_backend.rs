//! Audio output through rodio.
//!
//! The output stream itself is not `Send` on every platform, so it stays with
//! the caller; [`RodioBackend`] only holds a sink connected to its mixer.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use rodio::mixer::Mixer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use crate::error::BackendError;

use super::backend::PlaybackBackend;

const OUTPUT_STREAM_OPEN_RETRIES: usize = 20;
const OUTPUT_STREAM_OPEN_RETRY_MS: u64 = 100;

/// Open the default output stream, retrying while the device comes up.
pub fn open_output_stream_with_retry() -> Result<OutputStream, BackendError> {
    for attempt in 1..=OUTPUT_STREAM_OPEN_RETRIES {
        match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                if attempt == OUTPUT_STREAM_OPEN_RETRIES {
                    error!(
                        "failed to open default output stream after {} attempts: {}",
                        OUTPUT_STREAM_OPEN_RETRIES, err
                    );
                    return Err(BackendError::Unavailable(err.to_string()));
                }
                warn!(
                    "open_default_stream attempt {}/{} failed: {}",
                    attempt, OUTPUT_STREAM_OPEN_RETRIES, err
                );
                thread::sleep(Duration::from_millis(OUTPUT_STREAM_OPEN_RETRY_MS));
            }
        }
    }
    Err(BackendError::Unavailable("no output stream".to_string()))
}

/// Default output device together with a backend playing through it.
///
/// Dropping this closes the device, so keep it alive for the whole session.
pub struct RodioOutput {
    _stream: OutputStream,
    backend: Arc<RodioBackend>,
}

impl RodioOutput {
    pub fn open_default() -> Result<Self, BackendError> {
        let mut stream = open_output_stream_with_retry()?;
        stream.log_on_drop(false);
        let backend = Arc::new(RodioBackend::connect(stream.mixer()));
        Ok(Self {
            _stream: stream,
            backend,
        })
    }

    pub fn backend(&self) -> Arc<RodioBackend> {
        self.backend.clone()
    }
}

/// [`PlaybackBackend`] that plays one media file through a rodio sink.
pub struct RodioBackend {
    sink: Mutex<Sink>,
    path: Mutex<Option<(PathBuf, bool)>>,
}

impl RodioBackend {
    /// Connect a paused sink to `mixer`.
    pub fn connect(mixer: &Mixer) -> Self {
        let sink = Sink::connect_new(mixer);
        sink.pause();
        Self {
            sink: Mutex::new(sink),
            path: Mutex::new(None),
        }
    }

    fn sink(&self) -> MutexGuard<'_, Sink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append_media(&self, path: &Path, looping: bool) -> Result<(), BackendError> {
        let file = File::open(path).map_err(|err| BackendError::Media(err.to_string()))?;
        let reader = BufReader::new(file);
        let sink = self.sink();
        // Clearing also pauses; the caller decides when to play.
        sink.clear();
        if looping {
            let source = Decoder::new_looped(reader)
                .map_err(|err| BackendError::Media(err.to_string()))?;
            sink.append(source);
        } else {
            let source =
                Decoder::new(reader).map_err(|err| BackendError::Media(err.to_string()))?;
            sink.append(source);
        }
        Ok(())
    }
}

impl PlaybackBackend for RodioBackend {
    fn load(&self, path: &Path, looping: bool) -> Result<(), BackendError> {
        self.append_media(path, looping)?;
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((path.to_path_buf(), looping));
        info!("loaded {} (looping: {})", path.display(), looping);
        Ok(())
    }

    fn play(&self) {
        self.sink().play();
    }

    fn pause(&self) {
        self.sink().pause();
    }

    fn stop(&self) {
        let sink = self.sink();
        sink.clear();
    }

    fn set_volume(&self, volume: u8) {
        self.sink().set_volume(volume.min(100) as f32 / 100.0);
    }

    fn set_rate(&self, rate: f64) -> Result<(), BackendError> {
        let sink = self.sink();
        if sink.empty() {
            return Err(BackendError::Rejected("no media queued".to_string()));
        }
        sink.set_speed(rate as f32);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        let sink = self.sink();
        !sink.is_paused() && !sink.empty()
    }

    fn reload_looping_media(&self) -> Result<(), BackendError> {
        let path = self
            .path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match path {
            Some((path, _)) => self.append_media(&path, true),
            None => Err(BackendError::Media("no media loaded".to_string())),
        }
    }
}
