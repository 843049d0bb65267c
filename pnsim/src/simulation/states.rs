//! Core state types for the two-body simulation
//!
//! - `StateMatrix`: the 4x3 integrator state `[pos1, vel1, pos2, vel2]`
//! - `Body`: one body as seen by the render/edit side (display copy)
//! - `SimState`: the back buffer (state matrix + masses + physics time)
//! - `Snapshot`: an immutable edit-history entry
//!
//! Units throughout are AU, years and solar masses.

use std::f64::consts::PI;

use nalgebra::{Matrix4x3, Vector3};
use tracing::warn;

use crate::error::{SimError, SimResult};

pub type NVec3 = Vector3<f64>;
pub type StateMatrix = Matrix4x3<f64>;

/// Row indices into a [`StateMatrix`]
pub const POS1: usize = 0;
pub const VEL1: usize = 1;
pub const POS2: usize = 2;
pub const VEL2: usize = 3;

/// Mass used when a body is constructed with an unusable mass
pub const DEFAULT_MASS: f64 = 1.0;

/// Earth mass in solar masses, the threshold of the display radius relation
const EARTH_MASS: f64 = 3.003e-6;

/// Build a state matrix from the four row vectors
pub fn pack_state(pos1: NVec3, vel1: NVec3, pos2: NVec3, vel2: NVec3) -> StateMatrix {
    StateMatrix::from_rows(&[
        pos1.transpose(),
        vel1.transpose(),
        pos2.transpose(),
        vel2.transpose(),
    ])
}

/// Read row `i` of a state matrix as a column vector
pub fn row(y: &StateMatrix, i: usize) -> NVec3 {
    y.row(i).transpose()
}

fn vec_is_finite(v: &NVec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Display radius from mass. Not used by the physics.
pub fn display_radius(mass: f64) -> f64 {
    if mass > EARTH_MASS {
        1.0e3 * ((3.0 * (mass - EARTH_MASS)) / (4.0 * PI * 9_247_304.0)).cbrt() + 0.5
    } else {
        0.5
    }
}

/// A body as held by the render/edit side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    m: f64,       // mass, always > 0
    radius: f64,  // display radius derived from m
}

impl Body {
    /// Non-positive or non-finite masses are clamped to [`DEFAULT_MASS`]
    pub fn new(x: NVec3, v: NVec3, m: f64) -> Self {
        let m = if m.is_finite() && m > 0.0 {
            m
        } else {
            warn!(mass = m, "body mass must be positive, clamping to {DEFAULT_MASS}");
            DEFAULT_MASS
        };
        Self {
            x,
            v,
            m,
            radius: display_radius(m),
        }
    }

    pub fn mass(&self) -> f64 {
        self.m
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Rejects non-positive masses and keeps the previous value
    pub fn set_mass(&mut self, m: f64) -> SimResult<()> {
        if !(m.is_finite() && m > 0.0) {
            return Err(SimError::invalid_edit("mass", format!("{m} is not a positive finite mass")));
        }
        self.m = m;
        self.radius = display_radius(m);
        Ok(())
    }
}

/// The back buffer: what the physics thread integrates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimState {
    pub y: StateMatrix,
    pub m1: f64,
    pub m2: f64,
    pub physics_time: f64,
}

impl SimState {
    pub fn from_bodies(b1: &Body, b2: &Body) -> Self {
        Self {
            y: pack_state(b1.x, b1.v, b2.x, b2.v),
            m1: b1.mass(),
            m2: b2.mass(),
            physics_time: 0.0,
        }
    }

    pub fn pos1(&self) -> NVec3 {
        row(&self.y, POS1)
    }

    pub fn vel1(&self) -> NVec3 {
        row(&self.y, VEL1)
    }

    pub fn pos2(&self) -> NVec3 {
        row(&self.y, POS2)
    }

    pub fn vel2(&self) -> NVec3 {
        row(&self.y, VEL2)
    }

    pub fn total_mass(&self) -> f64 {
        self.m1 + self.m2
    }

    pub fn is_finite(&self) -> bool {
        self.y.iter().all(|c| c.is_finite()) && self.m1.is_finite() && self.m2.is_finite()
    }

    /// Newtonian energy of the relative orbit per reduced mass: v²/2 - Gm/r
    pub fn orbital_energy(&self, g: f64) -> f64 {
        let sep = self.pos1() - self.pos2();
        let v = self.vel1() - self.vel2();
        0.5 * v.norm_squared() - g * self.total_mass() / sep.norm()
    }

    /// Specific angular momentum of the relative orbit: r x v
    pub fn angular_momentum(&self) -> NVec3 {
        let sep = self.pos1() - self.pos2();
        let v = self.vel1() - self.vel2();
        sep.cross(&v)
    }

    /// Center-of-mass velocity, conserved while the split stays momentum-consistent
    pub fn com_velocity(&self) -> NVec3 {
        (self.m1 * self.vel1() + self.m2 * self.vel2()) / self.total_mass()
    }
}

/// Immutable edit-history entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub positions: [NVec3; 2],
    pub velocities: [NVec3; 2],
    pub masses: [f64; 2],
}

impl Snapshot {
    pub fn from_state(s: &SimState) -> Self {
        Self {
            positions: [s.pos1(), s.pos2()],
            velocities: [s.vel1(), s.vel2()],
            masses: [s.m1, s.m2],
        }
    }

    pub fn from_bodies(b1: &Body, b2: &Body) -> Self {
        Self {
            positions: [b1.x, b2.x],
            velocities: [b1.v, b2.v],
            masses: [b1.mass(), b2.mass()],
        }
    }

    /// Field-level validation for the edit path
    pub fn validate(&self) -> SimResult<()> {
        for i in 0..2 {
            if !vec_is_finite(&self.positions[i]) {
                return Err(SimError::invalid_edit(format!("body {} position", i + 1), "non-finite component"));
            }
            if !vec_is_finite(&self.velocities[i]) {
                return Err(SimError::invalid_edit(format!("body {} velocity", i + 1), "non-finite component"));
            }
            let m = self.masses[i];
            if !(m.is_finite() && m > 0.0) {
                return Err(SimError::invalid_edit(format!("body {} mass", i + 1), format!("{m} is not a positive finite mass")));
            }
        }
        Ok(())
    }

    pub fn state_matrix(&self) -> StateMatrix {
        pack_state(self.positions[0], self.velocities[0], self.positions[1], self.velocities[1])
    }

    /// Back-buffer value for this snapshot, physics time restarting at zero
    pub fn to_sim_state(&self) -> SimState {
        SimState {
            y: self.state_matrix(),
            m1: self.masses[0],
            m2: self.masses[1],
            physics_time: 0.0,
        }
    }

    pub fn bodies(&self) -> [Body; 2] {
        [
            Body::new(self.positions[0], self.velocities[0], self.masses[0]),
            Body::new(self.positions[1], self.velocities[1], self.masses[1]),
        ]
    }
}
