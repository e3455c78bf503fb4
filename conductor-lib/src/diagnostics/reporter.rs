//! Periodic fade and transport reporter for overlays and logs.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::JoinHandle,
    time::Duration,
};

use crate::playback::{PlaybackRamp, RampSnapshot};

/// Background reporter that polls a [`PlaybackRamp`] at a fixed interval and
/// hands every changed [`RampSnapshot`] to a callback.
#[derive(Clone)]
pub struct Reporter {
    ramp: PlaybackRamp,
    report: Arc<Mutex<dyn FnMut(RampSnapshot) + Send>>,
    interval: Duration,
    finish: Arc<AtomicBool>,
    thread_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Reporter {
    pub fn new(
        ramp: PlaybackRamp,
        report: Arc<Mutex<dyn FnMut(RampSnapshot) + Send>>,
        interval: Duration,
    ) -> Self {
        Self {
            ramp,
            report,
            interval,
            finish: Arc::new(AtomicBool::new(false)),
            thread_handle: Arc::new(Mutex::new(None)),
        }
    }

    fn run(&self) {
        let mut last_report: Option<RampSnapshot> = None;

        loop {
            let snapshot = self.ramp.snapshot();
            if last_report != Some(snapshot) {
                let mut report = self.report.lock().unwrap_or_else(PoisonError::into_inner);
                (*report)(snapshot);
                last_report = Some(snapshot);
            }

            if self.finish.load(Ordering::Relaxed) {
                break;
            }

            std::thread::sleep(self.interval);
        }
    }

    /// Start the background reporting thread, replacing a running one.
    pub fn start(&self) {
        self.stop();
        self.finish.store(false, Ordering::Relaxed);
        let this = self.clone();
        let handle = std::thread::spawn(move || this.run());
        *self
            .thread_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    /// Stop the background reporting thread. Safe to call repeatedly.
    pub fn stop(&self) {
        self.finish.store(true, Ordering::Relaxed);
        let handle = self
            .thread_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.thread().id() == std::thread::current().id() {
                log::warn!("reporter stop called from reporter thread; skipping join");
            } else if handle.join().is_err() {
                log::warn!("reporter thread panicked during join");
            }
        }
    }
}
