//! Double-buffered state exchange between the physics and render threads
//!
//! - back buffer: the integrator-facing [`SimState`], written only by the
//!   physics thread (and by edits)
//! - front buffer: display copies of the two bodies, refreshed from the back
//!   buffer by [`BufferBox::commit_to_front_buffer`]
//! - edit history: snapshots of user edits, touched only from the UI side
//!
//! Every accessor hands out values, never references into the buffers.
//! Locks are always taken in the order back -> front, and held only for
//! field copies.

use parking_lot::Mutex;
use tracing::{info, warn};

use super::history::EditHistory;
use super::states::{Body, NVec3, SimState, Snapshot, StateMatrix};
use crate::error::SimResult;

/// What the render thread draws
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontBuffer {
    pub bodies: [Body; 2],
    pub physics_time: f64,
}

#[derive(Debug)]
struct BackBuffer {
    state: SimState,
    epoch: u64, // bumped by every edit
}

#[derive(Debug)]
pub struct BufferBox {
    back: Mutex<BackBuffer>,
    front: Mutex<FrontBuffer>,
    history: Mutex<EditHistory<Snapshot>>,
}

impl BufferBox {
    /// Both buffers start from the two bodies; they are also the first
    /// history entry, so the first edit can be undone
    pub fn new(b1: Body, b2: Body, history_cap: usize) -> Self {
        let state = SimState::from_bodies(&b1, &b2);
        let mut history = EditHistory::new(history_cap);
        history.push(Snapshot::from_state(&state));

        Self {
            back: Mutex::new(BackBuffer { state, epoch: 0 }),
            front: Mutex::new(FrontBuffer {
                bodies: [b1, b2],
                physics_time: 0.0,
            }),
            history: Mutex::new(history),
        }
    }

    /// Value copy of the back buffer
    pub fn read_back_buffer(&self) -> SimState {
        self.back.lock().state
    }

    /// Back buffer together with the edit epoch it belongs to
    pub fn read_back_buffer_tagged(&self) -> (SimState, u64) {
        let back = self.back.lock();
        (back.state, back.epoch)
    }

    pub fn epoch(&self) -> u64 {
        self.back.lock().epoch
    }

    /// Physics thread: store a freshly integrated state
    ///
    /// `epoch` is the tag returned with the state the integration started
    /// from. If an edit landed in between, the result is stale and is
    /// dropped; returns whether it was stored.
    pub fn update_physics_state(&self, y: StateMatrix, advanced: f64, epoch: u64) -> bool {
        let mut back = self.back.lock();
        if back.epoch != epoch {
            return false;
        }
        back.state.y = y;
        back.state.physics_time += advanced;
        true
    }

    /// Copy back-buffer positions and velocities into the display bodies
    pub fn commit_to_front_buffer(&self) {
        let back = self.back.lock();
        let s = back.state;
        let mut front = self.front.lock();
        front.bodies[0].x = s.pos1();
        front.bodies[0].v = s.vel1();
        front.bodies[1].x = s.pos2();
        front.bodies[1].v = s.vel2();
        front.physics_time = s.physics_time;
    }

    /// Value copy of the front buffer for drawing
    pub fn read_front_buffer(&self) -> FrontBuffer {
        *self.front.lock()
    }

    /// Overwrite both buffers with user-supplied values and record the edit
    ///
    /// Invalid input (non-positive mass, non-finite vector) is rejected and
    /// nothing changes.
    pub fn apply_edit(&self, positions: [NVec3; 2], velocities: [NVec3; 2], masses: [f64; 2]) -> SimResult<()> {
        let snap = Snapshot {
            positions,
            velocities,
            masses,
        };
        if let Err(e) = snap.validate() {
            warn!(error = %e, "edit rejected");
            return Err(e);
        }

        self.install(&snap);
        self.history.lock().push(snap);
        info!(m1 = masses[0], m2 = masses[1], "edit applied");
        Ok(())
    }

    /// Re-apply the previous history entry; false when there is none
    pub fn undo(&self) -> bool {
        let snap = {
            let mut history = self.history.lock();
            if !history.undo() {
                return false;
            }
            history.read().copied()
        };
        match snap {
            Some(snap) => {
                self.install(&snap);
                info!("undo");
                true
            }
            None => false,
        }
    }

    /// Re-apply the next history entry; false when there is none
    pub fn redo(&self) -> bool {
        let snap = {
            let mut history = self.history.lock();
            if !history.redo() {
                return false;
            }
            history.read().copied()
        };
        match snap {
            Some(snap) => {
                self.install(&snap);
                info!("redo");
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.lock().can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Write a snapshot to both buffers, physics time carries on
    fn install(&self, snap: &Snapshot) {
        let mut back = self.back.lock();
        let physics_time = back.state.physics_time;
        back.state = SimState {
            physics_time,
            ..snap.to_sim_state()
        };
        back.epoch += 1;

        let mut front = self.front.lock();
        front.bodies = snap.bodies();
        front.physics_time = physics_time;
    }
}
