//! Physics thread: fixed-tick loop around the integrator
//!
//! Each frame the engine turns elapsed wall-clock time (scaled by
//! `sim_speed`, excluding time spent paused) into as many fixed
//! `physics_dt` macro-steps as fit, publishing each accepted result through
//! the [`BufferBox`]. It parks on the controller while paused and stops
//! advancing once the integrator crashes.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::controller::SimulationController;
use super::exchange::BufferBox;
use super::integrator::Rk45;
use super::params::Parameters;
use crate::error::{SimError, SimResult};

/// Longest wall-clock gap turned into simulated time in one frame
const MAX_FRAME_SECS: f64 = 0.25;

/// Counters accumulated over the engine's lifetime
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    pub ticks: u64, // macro-steps run
    pub attempts: u64, // sub-step attempts
    pub accepted: u64,
    pub rejected: u64,
    pub discarded: u64, // results dropped because an edit raced them
    pub last_mean_step: f64,
}

impl RunStats {
    pub fn accept_ratio(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }
}

/// Result of one macro-step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    Discarded,
    Crashed,
}

pub struct Engine {
    integrator: Rk45,
    buffers: Arc<BufferBox>,
    controller: Arc<SimulationController>,
    physics_dt: f64,
    sim_speed: f64,
    frame: Duration,
    accum: f64,
    last_epoch: u64,
    stats: RunStats,
    failure: Option<SimError>, // why the last crash happened
}

impl Engine {
    pub fn new(integrator: Rk45, buffers: Arc<BufferBox>, controller: Arc<SimulationController>, params: &Parameters) -> Self {
        let last_epoch = buffers.epoch();
        Self {
            integrator,
            buffers,
            controller,
            physics_dt: params.physics_dt,
            sim_speed: params.sim_speed,
            frame: Duration::from_millis(params.frame_ms),
            accum: 0.0,
            last_epoch,
            stats: RunStats::default(),
            failure: None,
        }
    }

    pub fn buffers(&self) -> Arc<BufferBox> {
        Arc::clone(&self.buffers)
    }

    pub fn controller(&self) -> Arc<SimulationController> {
        Arc::clone(&self.controller)
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn physics_dt(&self) -> f64 {
        self.physics_dt
    }

    /// Sub-step size the next macro-step starts from
    pub fn step_size(&self) -> f64 {
        self.integrator.step_size()
    }

    /// Run one `physics_dt` macro-step from the current back buffer
    pub fn step_once(&mut self) -> TickOutcome {
        let (state, epoch) = self.buffers.read_back_buffer_tagged();
        if epoch != self.last_epoch {
            // state was replaced by an edit: forget the carried step size
            self.integrator.reset();
            self.last_epoch = epoch;
        }

        let report = match self.integrator.step(&state, self.physics_dt) {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, physics_time = state.physics_time, "physics step failed");
                self.failure = Some(e);
                self.controller.raise_crash();
                self.accum = 0.0;
                return TickOutcome::Crashed;
            }
        };

        self.stats.ticks += 1;
        self.stats.attempts += u64::from(report.count);
        self.stats.accepted += u64::from(report.accepted);
        self.stats.rejected += u64::from(report.rejected);
        if report.accepted > 0 {
            self.stats.last_mean_step = report.mean_step;
        }

        // On a crash the report still holds the last accepted state
        let stored = self.buffers.update_physics_state(report.state, report.time_reached, epoch);
        if stored {
            self.buffers.commit_to_front_buffer();
        } else {
            self.stats.discarded += 1;
        }

        if report.crashed {
            let time_reached = state.physics_time + report.time_reached;
            warn!(
                physics_time = time_reached,
                rejections = report.streak,
                "integration crashed, physics halted"
            );
            self.failure = Some(SimError::IntegrationCrash {
                rejections: report.streak,
                time_reached,
            });
            self.controller.raise_crash();
            self.accum = 0.0;
            return TickOutcome::Crashed;
        }

        debug!(
            attempts = report.count,
            accepted = report.accepted,
            rejected = report.rejected,
            mean_step = report.mean_step,
            "macro-step"
        );

        if stored {
            TickOutcome::Advanced
        } else {
            TickOutcome::Discarded
        }
    }

    /// Turn `wall_dt` seconds into fixed macro-steps; returns how many ran
    pub fn tick(&mut self, wall_dt: f64) -> usize {
        self.accum += wall_dt.clamp(0.0, MAX_FRAME_SECS) * self.sim_speed;

        let mut steps = 0;
        while self.accum >= self.physics_dt {
            self.accum -= self.physics_dt;
            steps += 1;
            if self.step_once() == TickOutcome::Crashed {
                break;
            }
        }
        steps
    }

    /// Advance by at least `years` of simulated time without wall-clock pacing
    pub fn run_for(&mut self, years: f64) -> SimResult<RunStats> {
        if !(years.is_finite() && years >= 0.0) {
            return Err(SimError::InvalidInterval { requested_dt: years });
        }
        let start = self.buffers.read_back_buffer().physics_time;
        while self.buffers.read_back_buffer().physics_time - start < years {
            if self.step_once() == TickOutcome::Crashed {
                if let Some(e) = self.failure.take() {
                    return Err(e);
                }
            }
        }
        Ok(self.stats)
    }

    /// Physics thread body: wait-if-paused, integrate, commit, sleep
    pub fn run(&mut self) {
        info!(physics_dt = self.physics_dt, sim_speed = self.sim_speed, "physics thread started");
        let mut last = Instant::now();

        loop {
            let parked = self.controller.is_paused();
            if !self.controller.wait_while_paused() {
                break;
            }
            if parked {
                // paused time does not count as simulated time
                last = Instant::now();
                self.accum = 0.0;
            }

            let now = Instant::now();
            let wall_dt = now.duration_since(last).as_secs_f64();
            last = now;

            self.tick(wall_dt);
            thread::sleep(self.frame);
        }

        info!(
            ticks = self.stats.ticks,
            accepted = self.stats.accepted,
            rejected = self.stats.rejected,
            accept_ratio = self.stats.accept_ratio(),
            "physics thread stopped"
        );
    }

    /// Move the engine onto its own OS thread
    pub fn spawn(mut self) -> SimResult<JoinHandle<RunStats>> {
        let handle = thread::Builder::new().name("physics".into()).spawn(move || {
            self.run();
            self.stats
        })?;
        Ok(handle)
    }
}
