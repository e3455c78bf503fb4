//! Click-free volume ramps and transport sequencing.
//!
//! [`PlaybackRamp`] owns the level of one [`PlaybackBackend`]. Volume changes
//! are handed to a single background worker that approaches the target
//! exponentially at a fixed tick, so the foreground frame loop never blocks
//! on a fade. Pausing is sequenced behind a fade-out: a transient watcher
//! waits for the level to become silent before it pauses the backend.
//!
//! All mutable state lives in one [`RampState`] behind one mutex. The worker
//! and the pause watchers sleep on a condition variable that is signalled on
//! every retarget, every ramp tick and on shutdown.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::{ControlConfig, RampConfig, VolumeConfig};

use super::backend::PlaybackBackend;

const MIN_RATE: f64 = 0.5;
const MAX_RATE: f64 = 2.0;
const MAX_VOLUME: i32 = 100;

/// Transport state as requested through the ramp.
///
/// This reflects what the ramp has asked for, which can run ahead of the
/// backend: during a fade-out the backend still plays while the transport
/// already reads [`TransportState::Pausing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Playback was never started.
    Idle,
    Playing,
    /// Fading out; the backend is paused once the level is silent.
    Pausing,
    Paused,
}

/// Point-in-time view of the ramp for telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampSnapshot {
    pub current_volume: f64,
    pub target_volume: u8,
    pub fading: bool,
    pub transport: TransportState,
    pub rate: f64,
}

struct RampState {
    current_volume: f64,
    target_volume: u8,
    /// Level that `play()` fades back to after a pause.
    resume_volume: u8,
    is_fading: bool,
    running: bool,
    worker_alive: bool,
    worker_spawns: u64,
    /// Bumped on every retarget; the worker restarts its tick budget when it
    /// observes a new value.
    generation: u64,
    /// Ticket of the pause watcher allowed to pause the backend, 0 for none.
    pause_ticket: u64,
    next_ticket: u64,
    transport: TransportState,
    ready: bool,
    last_rate: f64,
    applied_rate: Option<f64>,
}

struct Shared {
    state: Mutex<RampState>,
    changed: Condvar,
    backend: Arc<dyn PlaybackBackend>,
    config: RampConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RampState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(
        &self,
        guard: MutexGuard<'a, RampState>,
        timeout: Duration,
    ) -> MutexGuard<'a, RampState> {
        match self.changed.wait_timeout(guard, timeout) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        }
    }

    fn tick(&self) -> Duration {
        Duration::from_millis(self.config.tick_ms.max(1))
    }
}

/// Fade engine and transport sequencer for one playback backend.
///
/// Cloning yields another handle to the same ramp.
#[derive(Clone)]
pub struct PlaybackRamp {
    shared: Arc<Shared>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
    volume: VolumeConfig,
}

impl PlaybackRamp {
    /// Create a ramp for `backend`. The level starts silent and the first
    /// `play()` fades in to `config.control.default_volume`.
    pub fn new(backend: Arc<dyn PlaybackBackend>, config: &ControlConfig) -> Self {
        let resume_volume = config.control.default_volume.min(100);
        let state = RampState {
            current_volume: 0.0,
            target_volume: resume_volume,
            resume_volume,
            is_fading: false,
            running: true,
            worker_alive: false,
            worker_spawns: 0,
            generation: 0,
            pause_ticket: 0,
            next_ticket: 1,
            transport: TransportState::Idle,
            ready: false,
            last_rate: config.control.default_rate.clamp(MIN_RATE, MAX_RATE),
            applied_rate: None,
        };

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                changed: Condvar::new(),
                backend,
                config: config.ramp,
            }),
            worker: Arc::new(Mutex::new(None)),
            volume: config.volume,
        }
    }

    /// Start a fade towards `target` (clamped to `0..=100`).
    ///
    /// Returns immediately. A live worker is retargeted in place; otherwise
    /// one is spawned.
    ///
    /// While paused or fading out for a pause, only the level that the next
    /// `play()` fades back to is updated.
    pub fn ramp_to(&self, target: i32) {
        let target = target.clamp(0, MAX_VOLUME) as u8;
        let mut state = self.shared.lock();
        state.resume_volume = target;
        if matches!(
            state.transport,
            TransportState::Pausing | TransportState::Paused
        ) {
            return;
        }
        let settled = !state.is_fading
            && state.target_volume == target
            && (state.current_volume - target as f64).abs() < 1.0;
        if settled {
            return;
        }
        let spawn = self.retarget(&mut state, target);
        drop(state);

        if spawn {
            self.spawn_worker();
        }
    }

    /// Retarget under the lock. Returns `true` when the caller must spawn the
    /// worker (the slot is already claimed).
    fn retarget(&self, state: &mut RampState, target: u8) -> bool {
        if !state.running {
            debug!("ramp to {} requested after shutdown", target);
            return false;
        }
        state.target_volume = target;
        state.is_fading = true;
        state.generation = state.generation.wrapping_add(1);
        self.shared.changed.notify_all();

        if state.worker_alive {
            return false;
        }
        state.worker_alive = true;
        state.worker_spawns += 1;
        true
    }

    fn spawn_worker(&self) {
        let shared = self.shared.clone();
        let handle = thread::spawn(move || run_ramp_worker(shared));
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Start or resume playback with a fade-in.
    ///
    /// The first call starts the backend silently, waits for it to settle and
    /// applies the stored rate before fading in. Resuming from a completed
    /// pause also starts at level 0. A pending pause is cancelled.
    pub fn play(&self) {
        let mut state = self.shared.lock();
        state.pause_ticket = 0;
        let silent_start = !state.ready || state.transport == TransportState::Paused;
        state.transport = TransportState::Playing;
        let cold = !state.ready;
        if silent_start {
            state.current_volume = 0.0;
        }
        let rate = state.last_rate;
        let resume = state.resume_volume;
        drop(state);

        let backend = &self.shared.backend;
        if silent_start {
            backend.set_volume(0);
        }
        if cold {
            info!("starting playback");
            backend.play();
            thread::sleep(Duration::from_millis(self.shared.config.settle_ms));
            self.apply_rate(rate);
            self.shared.lock().ready = true;
        } else {
            info!("resuming playback");
            backend.play();
        }

        self.ramp_to(resume as i32);
    }

    /// Fade out, then pause the backend once the level is silent.
    ///
    /// Returns immediately; the backend pause happens on a watcher thread.
    pub fn pause(&self) {
        let mut state = self.shared.lock();
        match state.transport {
            TransportState::Playing => {}
            TransportState::Pausing => {
                debug!("pause already in progress");
                return;
            }
            TransportState::Idle | TransportState::Paused => {
                debug!("pause ignored in {:?}", state.transport);
                return;
            }
        }

        info!("pausing playback");
        state.transport = TransportState::Pausing;
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.pause_ticket = ticket;
        let spawn = self.retarget(&mut state, 0);
        drop(state);

        if spawn {
            self.spawn_worker();
        }

        let shared = self.shared.clone();
        thread::spawn(move || run_pause_watcher(shared, ticket));
    }

    /// Restart the looping media from the beginning with a fade-in.
    ///
    /// The media is reloaded rather than seeked, so playback starts exactly at
    /// zero.
    pub fn restart(&self) {
        info!("restarting playback");
        let mut state = self.shared.lock();
        state.pause_ticket = 0;
        state.ready = false;
        state.applied_rate = None;
        let rate = state.last_rate;
        let resume = state.resume_volume;
        drop(state);

        let backend = &self.shared.backend;
        backend.stop();
        if let Err(err) = backend.reload_looping_media() {
            warn!("failed to reload media for restart: {}", err);
        }

        self.shared.lock().current_volume = 0.0;
        backend.set_volume(0);
        backend.play();
        thread::sleep(Duration::from_millis(self.shared.config.settle_ms));
        self.apply_rate(rate);

        let mut state = self.shared.lock();
        state.ready = true;
        state.transport = TransportState::Playing;
        drop(state);

        self.ramp_to(resume as i32);
    }

    /// Map a gesture value in `[0, 1]` to a volume fade.
    ///
    /// The gesture scales the baseline level by `0.5..=1.5` and never goes
    /// below the configured floor, so a gesture alone cannot silence the music.
    pub fn set_expressive_volume(&self, gesture: f64) {
        self.ramp_to(self.expressive_level(gesture));
    }

    fn expressive_level(&self, gesture: f64) -> i32 {
        let multiplier = 0.5 + gesture.clamp(0.0, 1.0);
        let raw = (multiplier * self.volume.baseline) as i32;
        raw.clamp(self.volume.floor as i32, MAX_VOLUME)
    }

    /// Set the playback rate (clamped to `0.5..=2.0`) without a ramp.
    ///
    /// Backend rejections are logged and dropped; the rate is retried on the
    /// next call.
    pub fn set_rate(&self, rate: f64) {
        let rate = rate.clamp(MIN_RATE, MAX_RATE);
        let mut state = self.shared.lock();
        state.last_rate = rate;
        let unchanged = state.applied_rate == Some(rate);
        drop(state);

        if !unchanged {
            self.apply_rate(rate);
        }
    }

    fn apply_rate(&self, rate: f64) {
        let applied = match self.shared.backend.set_rate(rate) {
            Ok(()) => Some(rate),
            Err(err) => {
                debug!("ignoring rate change to {:.3}: {}", rate, err);
                None
            }
        };
        self.shared.lock().applied_rate = applied;
    }

    /// Whether the backend reports that it is producing audio.
    pub fn is_playing(&self) -> bool {
        self.shared.backend.is_playing()
    }

    pub fn transport(&self) -> TransportState {
        self.shared.lock().transport
    }

    pub fn current_volume(&self) -> f64 {
        self.shared.lock().current_volume
    }

    pub fn target_volume(&self) -> u8 {
        self.shared.lock().target_volume
    }

    /// Rate most recently requested through [`PlaybackRamp::set_rate`].
    pub fn rate(&self) -> f64 {
        self.shared.lock().last_rate
    }

    pub fn snapshot(&self) -> RampSnapshot {
        let state = self.shared.lock();
        RampSnapshot {
            current_volume: state.current_volume,
            target_volume: state.target_volume,
            fading: state.is_fading,
            transport: state.transport,
            rate: state.last_rate,
        }
    }

    /// How many ramp workers this instance has spawned.
    pub fn worker_spawns(&self) -> u64 {
        self.shared.lock().worker_spawns
    }

    /// Block until no fade and no pause are in flight, or `timeout` elapses.
    ///
    /// Returns `true` when idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        loop {
            let busy = state.is_fading || state.pause_ticket != 0;
            if !busy {
                return true;
            }
            if !state.running {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self.shared.wait(state, deadline - now);
        }
    }

    /// Stop the background worker. Pending pause watchers exit without
    /// pausing the backend.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        if !state.running {
            return;
        }
        state.running = false;
        self.shared.changed.notify_all();
        drop(state);

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                warn!("ramp shutdown called from ramp worker; skipping join");
            } else if handle.join().is_err() {
                warn!("ramp worker panicked during join");
            }
        }
        debug!("playback ramp shut down");
    }
}

/// Clears the worker slot when the worker exits, however it exits.
struct WorkerGuard {
    shared: Arc<Shared>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.worker_alive = false;
        state.is_fading = false;
        self.shared.changed.notify_all();
    }
}

fn run_ramp_worker(shared: Arc<Shared>) {
    let _guard = WorkerGuard {
        shared: shared.clone(),
    };
    let tick = shared.tick();
    let max_ticks = shared.config.max_ticks();
    let step = shared.config.step_fraction;
    debug!("ramp worker started");

    let mut state = shared.lock();
    loop {
        while state.running && !state.is_fading {
            state = shared.wait(state, Duration::from_secs(1));
        }
        if !state.running {
            break;
        }

        let mut generation = state.generation;
        let mut ticks = 0;
        loop {
            if state.generation != generation {
                generation = state.generation;
                ticks = 0;
            }

            let target = state.target_volume as f64;
            let diff = target - state.current_volume;
            if diff.abs() < 1.0 || ticks >= max_ticks {
                break;
            }

            state.current_volume = (state.current_volume + diff * step).clamp(0.0, 100.0);
            shared.backend.set_volume(state.current_volume.round() as u8);
            ticks += 1;
            shared.changed.notify_all();

            state = sleep_tick(&shared, state, tick);
            if !state.running {
                debug!("ramp worker stopping mid-fade");
                return;
            }
        }

        let target = state.target_volume;
        state.current_volume = target as f64;
        shared.backend.set_volume(target);
        state.is_fading = false;
        shared.changed.notify_all();
    }

    debug!("ramp worker stopped");
}

/// Sleep one full tick with the lock released. Wakes early only on shutdown.
fn sleep_tick<'a>(
    shared: &Shared,
    mut state: MutexGuard<'a, RampState>,
    tick: Duration,
) -> MutexGuard<'a, RampState> {
    let deadline = Instant::now() + tick;
    while state.running {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        state = shared.wait(state, deadline - now);
    }
    state
}

fn run_pause_watcher(shared: Arc<Shared>, ticket: u64) {
    let tick = shared.tick();
    let silence = shared.config.silence_threshold;
    let mut state = shared.lock();
    loop {
        if !state.running {
            warn!("pause watcher abandoned by shutdown");
            return;
        }
        if state.pause_ticket != ticket {
            debug!("pause watcher {} cancelled", ticket);
            return;
        }
        if state.current_volume <= silence {
            shared.backend.pause();
            state.pause_ticket = 0;
            state.transport = TransportState::Paused;
            shared.changed.notify_all();
            debug!("backend paused after fade-out");
            return;
        }
        state = shared.wait(state, tick);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::memory::{BackendCall, MemoryBackend};

    const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

    fn fast_config() -> ControlConfig {
        let mut config = ControlConfig::default();
        config.ramp.tick_ms = 2;
        config.ramp.settle_ms = 1;
        config
    }

    fn ramp_with(config: &ControlConfig) -> (Arc<MemoryBackend>, PlaybackRamp) {
        let backend = Arc::new(MemoryBackend::new());
        let ramp = PlaybackRamp::new(backend.clone(), config);
        (backend, ramp)
    }

    #[test]
    fn ramp_converges_exactly_on_target() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.ramp_to(63);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(ramp.current_volume(), 63.0);
        assert_eq!(backend.volume(), 63);
        ramp.shutdown();
    }

    #[test]
    fn ramp_is_monotonic_without_overshoot() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.ramp_to(90);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        let rising = backend.volume_history();
        assert!(rising.windows(2).all(|w| w[0] <= w[1]), "{:?}", rising);
        assert!(rising.iter().all(|&v| v <= 90));

        let before = rising.len();
        ramp.ramp_to(20);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        let falling = &backend.volume_history()[before..];
        assert!(falling.windows(2).all(|w| w[0] >= w[1]), "{:?}", falling);
        assert!(falling.iter().all(|&v| v >= 20));
        assert_eq!(falling.last(), Some(&20));
        ramp.shutdown();
    }

    #[test]
    fn ramp_exponential_steps_cover_a_quarter() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.ramp_to(100);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        let history = backend.volume_history();
        assert_eq!(&history[..3], &[25, 44, 58]);
        ramp.shutdown();
    }

    #[test]
    fn target_is_clamped() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.ramp_to(400);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 100);
        ramp.ramp_to(-20);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 0);
        ramp.shutdown();
    }

    #[test]
    fn rapid_retargets_share_one_worker() {
        let mut config = fast_config();
        config.ramp.tick_ms = 10;
        let (backend, ramp) = ramp_with(&config);
        for target in [10, 80, 30, 55, 70] {
            ramp.ramp_to(target);
        }
        assert_eq!(ramp.worker_spawns(), 1);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 70);

        // The idle worker is re-armed rather than respawned.
        ramp.ramp_to(40);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(ramp.worker_spawns(), 1);
        ramp.shutdown();
    }

    #[test]
    fn short_budget_snaps_to_target() {
        let mut config = fast_config();
        config.ramp.tick_ms = 10;
        config.ramp.ramp_time = 0.02;
        let (backend, ramp) = ramp_with(&config);
        ramp.ramp_to(100);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume_history(), vec![25, 44, 100]);
        ramp.shutdown();
    }

    #[test]
    fn expressive_volume_bounds() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.set_expressive_volume(0.0);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 35);

        ramp.set_expressive_volume(1.0);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 100);

        ramp.set_expressive_volume(0.5);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 70);
        ramp.shutdown();
    }

    #[test]
    fn cold_play_starts_silent_and_fades_in() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        let calls = backend.calls();
        assert_eq!(calls[0], BackendCall::SetVolume(0));
        assert_eq!(calls[1], BackendCall::Play);
        assert_eq!(calls[2], BackendCall::SetRate(1.0));
        assert_eq!(backend.volume(), 70);
        assert_eq!(ramp.transport(), TransportState::Playing);
        ramp.shutdown();
    }

    #[test]
    fn pause_waits_for_silence() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));

        ramp.pause();
        assert_eq!(ramp.transport(), TransportState::Pausing);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(ramp.transport(), TransportState::Paused);
        assert_eq!(backend.pause_count(), 1);

        let calls = backend.calls();
        let pause_at = calls
            .iter()
            .position(|call| *call == BackendCall::Pause)
            .expect("backend paused");
        let last_volume = calls[..pause_at]
            .iter()
            .rev()
            .find_map(|call| match call {
                BackendCall::SetVolume(v) => Some(*v),
                _ => None,
            })
            .expect("volume pushed before pause");
        assert!(last_volume <= 1, "paused at volume {}", last_volume);
        ramp.shutdown();
    }

    #[test]
    fn play_after_pause_restores_resume_level() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.play();
        ramp.ramp_to(80);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        ramp.pause();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 0);

        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 80);
        assert!(backend.is_playing());
        ramp.shutdown();
    }

    #[test]
    fn retarget_while_paused_only_moves_resume_level() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        ramp.pause();
        ramp.ramp_to(90);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(ramp.transport(), TransportState::Paused);
        assert_eq!(backend.volume(), 0);

        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume(), 90);
        ramp.shutdown();
    }

    #[test]
    fn settled_target_pushes_nothing() {
        let (backend, ramp) = ramp_with(&fast_config());
        ramp.ramp_to(50);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        let pushed = backend.volume_history().len();
        ramp.ramp_to(50);
        ramp.ramp_to(50);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.volume_history().len(), pushed);
        ramp.shutdown();
    }

    #[test]
    fn play_cancels_pending_pause() {
        let mut config = fast_config();
        config.ramp.tick_ms = 20;
        let (backend, ramp) = ramp_with(&config);
        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));

        ramp.pause();
        ramp.pause();
        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        assert_eq!(backend.pause_count(), 0);
        assert_eq!(ramp.transport(), TransportState::Playing);
        assert_eq!(backend.volume(), 70);
        ramp.shutdown();
    }

    #[test]
    fn rate_is_clamped_and_rejections_retry() {
        let (backend, ramp) = ramp_with(&fast_config());
        // Rejected while the backend is not playing.
        ramp.set_rate(3.0);
        assert_eq!(ramp.rate(), 2.0);
        assert_eq!(backend.count(&BackendCall::RejectedRate(2.0)), 1);

        backend.play();
        ramp.set_rate(3.0);
        assert_eq!(backend.rate(), 2.0);
        // Unchanged rate is not pushed again.
        ramp.set_rate(2.0);
        assert_eq!(backend.count(&BackendCall::SetRate(2.0)), 1);

        ramp.set_rate(0.1);
        assert_eq!(backend.rate(), 0.5);
        ramp.shutdown();
    }

    #[test]
    fn restart_reloads_and_fades_in() {
        let (backend, ramp) = ramp_with(&fast_config());
        backend
            .load(std::path::Path::new("loop.ogg"), true)
            .expect("load memory media");
        ramp.play();
        ramp.set_rate(1.1);
        assert!(ramp.wait_idle(IDLE_TIMEOUT));

        ramp.restart();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        let calls = backend.calls();
        let stop_at = calls
            .iter()
            .position(|call| *call == BackendCall::Stop)
            .expect("stopped");
        assert_eq!(
            &calls[stop_at..stop_at + 5],
            &[
                BackendCall::Stop,
                BackendCall::Reload,
                BackendCall::SetVolume(0),
                BackendCall::Play,
                BackendCall::SetRate(1.1),
            ]
        );
        assert_eq!(backend.volume(), 70);
        assert_eq!(ramp.transport(), TransportState::Playing);
        ramp.shutdown();
    }

    #[test]
    fn shutdown_stops_worker_and_watchers() {
        let mut config = fast_config();
        config.ramp.tick_ms = 50;
        let (backend, ramp) = ramp_with(&config);
        ramp.play();
        assert!(ramp.wait_idle(IDLE_TIMEOUT));
        ramp.pause();
        ramp.shutdown();
        // The watcher never got to pause, so the ramp cannot become idle.
        assert!(!ramp.wait_idle(Duration::from_millis(10)));
        assert!(!ramp.snapshot().fading);
        // Give a stray watcher time to misbehave.
        thread::sleep(Duration::from_millis(100));
        assert_eq!(backend.pause_count(), 0);

        // Requests after shutdown spawn nothing and start no fade.
        let spawns = ramp.worker_spawns();
        ramp.ramp_to(10);
        assert_eq!(ramp.worker_spawns(), spawns);
        thread::sleep(Duration::from_millis(20));
        assert!(!ramp.snapshot().fading);
    }
}
