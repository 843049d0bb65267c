//! Pause/halt/crash signalling between the physics and render threads
//!
//! The UI side sets and clears the pause flag; the physics thread parks on
//! the condition variable at the top of its loop while paused and reports
//! that it is parked through `halted`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct SimulationController {
    paused: Mutex<bool>,
    resume: Condvar,
    halted: AtomicBool,
    crashed: AtomicBool,
    shutdown: AtomicBool,
}

impl SimulationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        let mut paused = self.paused.lock();
        if !*paused {
            info!("physics paused");
        }
        *paused = true;
    }

    /// Clears the pause flag. Does nothing while a crash is flagged.
    pub fn resume(&self) {
        if self.is_crashed() {
            warn!("resume ignored: integrator crashed, edit or undo the state first");
            return;
        }
        let mut paused = self.paused.lock();
        if *paused {
            info!("physics resumed");
        }
        *paused = false;
        self.resume.notify_all();
    }

    pub fn toggle_pause(&self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    /// True while the physics thread is parked on the pause flag
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Physics-thread side: block while paused. Returns false on shutdown.
    pub fn wait_while_paused(&self) -> bool {
        let mut paused = self.paused.lock();
        while *paused && !self.is_shutdown() {
            self.halted.store(true, Ordering::Release);
            // Timed so a shutdown without a notify is still observed
            self.resume.wait_for(&mut paused, Duration::from_millis(100));
        }
        self.halted.store(false, Ordering::Release);
        !self.is_shutdown()
    }

    /// Flag a crash and pause until the state is edited
    pub fn raise_crash(&self) {
        self.crashed.store(true, Ordering::Release);
        self.pause();
    }

    pub fn clear_crash(&self) {
        self.crashed.store(false, Ordering::Release);
    }

    pub fn is_crashed(&self) -> bool {
        self.crashed.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _guard = self.paused.lock();
        self.resume.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
