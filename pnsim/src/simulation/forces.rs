//! Post-Newtonian force model for the relative two-body orbit
//!
//! The relative acceleration is
//!
//! ```text
//! a_rel = (μ/r²) · ( −n̂ + c⁻²·A_1PN + c⁻⁴·A_2PN + c⁻⁵·A_2.5PN )
//! ```
//!
//! Each bracketed contribution is an [`Acceleration`] term and an
//! [`AccelSet`] sums the active terms in that order before applying the
//! common `μ/r²` factor. Newtonian gravity, 1PN and 2PN are conservative;
//! the 2.5PN radiation-reaction term is dissipative.
//!
//! Units are AU, years and solar masses.

use std::f64::consts::PI;

use crate::error::{SimError, SimResult};
use crate::simulation::states::{row, NVec3, StateMatrix, POS1, POS2, VEL1, VEL2};

/// Newtonian gravitational constant in AU³ / (M☉ · yr²)
pub const G: f64 = 4.0 * PI * PI;

/// Speed of light in AU / yr
pub const C: f64 = 63241.0771;

/// Relative kinematics shared by every force term
#[derive(Debug, Clone, Copy)]
pub struct PairKinematics {
    pub n_hat: NVec3, // unit separation vector, body 2 -> body 1
    pub v: NVec3,     // relative velocity v1 - v2
    pub r: f64,       // scalar separation
    pub r_dot: f64,   // radial velocity v·n̂
    pub v2: f64,      // v·v
    pub mu: f64,      // G·m
    pub mu_r: f64,    // μ/r
    pub eta: f64,     // symmetric mass ratio m1·m2/m²
}

impl PairKinematics {
    pub fn new(pos1: NVec3, pos2: NVec3, vel1: NVec3, vel2: NVec3, m1: f64, m2: f64, g: f64) -> SimResult<Self> {
        let m = m1 + m2;
        if !(m.is_finite() && m > 0.0) || m1 < 0.0 || m2 < 0.0 {
            return Err(SimError::DegenerateMass { m1, m2 });
        }

        let sep = pos1 - pos2;
        let r = sep.norm();
        if !(r.is_finite() && r > 0.0) {
            return Err(SimError::SingularSeparation { separation: r });
        }

        let v = vel1 - vel2;
        let inv_r = 1.0 / r;
        let n_hat = sep * inv_r;
        let mu = g * m;

        Ok(Self {
            n_hat,
            v,
            r,
            r_dot: v.dot(&n_hat),
            v2: v.dot(&v),
            mu,
            mu_r: mu * inv_r,
            eta: (m1 * m2) / (m * m),
        })
    }

    /// Unpack positions and velocities from a `[pos1, vel1, pos2, vel2]` state
    pub fn from_state(y: &StateMatrix, m1: f64, m2: f64, g: f64) -> SimResult<Self> {
        Self::new(row(y, POS1), row(y, POS2), row(y, VEL1), row(y, VEL2), m1, m2, g)
    }
}

/// A dimensionless contribution to the bracket multiplying `μ/r²`
pub trait Acceleration {
    fn acceleration(&self, k: &PairKinematics) -> NVec3;

    /// Radiation-reaction terms return true
    fn is_dissipative(&self) -> bool {
        false
    }
}

/// Newtonian attraction, `−n̂`
pub struct Newtonian;

impl Acceleration for Newtonian {
    fn acceleration(&self, k: &PairKinematics) -> NVec3 {
        -k.n_hat
    }
}

/// First post-Newtonian correction, scaled by `c⁻²`
pub struct FirstPn {
    pub c: f64,
}

impl FirstPn {
    /// `A_1PN` without the `c⁻²` factor
    pub fn coefficient(k: &PairKinematics) -> NVec3 {
        let eta = k.eta;
        let r_dot2 = k.r_dot * k.r_dot;

        // ((4 + 2η)μ/r − (1 + 3η)v² + 3/2 η ṙ²) n̂ + (4 − 2η) ṙ v
        (((4.0 + (2.0 * eta)) * k.mu_r) - ((1.0 + (3.0 * eta)) * k.v2) + (1.5 * (eta * r_dot2))) * k.n_hat
            + ((4.0 - (2.0 * eta)) * k.r_dot) * k.v
    }
}

impl Acceleration for FirstPn {
    fn acceleration(&self, k: &PairKinematics) -> NVec3 {
        let c2 = 1.0 / (self.c * self.c);
        c2 * Self::coefficient(k)
    }
}

/// Second post-Newtonian correction, scaled by `c⁻⁴`
pub struct SecondPn {
    pub c: f64,
}

impl SecondPn {
    /// `A_2PN` without the `c⁻⁴` factor
    pub fn coefficient(k: &PairKinematics) -> NVec3 {
        let eta = k.eta;
        let mu_r = k.mu_r;
        let v_2 = k.v2;
        let r_dot = k.r_dot;
        let r_dot2 = r_dot * r_dot;
        let v_4 = v_2 * v_2;
        let r_dot4 = r_dot2 * r_dot2;
        let mu_r2 = mu_r * mu_r;

        let n_part = (0.75 * (12.0 + 29.0 * eta) * mu_r2)
            + (eta * (3.0 - 4.0 * eta) * v_4)
            + ((15.0 / 8.0) * eta * (1.0 - 3.0 * eta) * r_dot4)
            - (1.5 * eta * (3.0 - 4.0 * eta) * v_2 * r_dot2)
            - (0.5 * eta * (13.0 - 4.0 * eta) * mu_r * v_2)
            - (2.0 + (25.0 * eta) + 2.0 * (eta * eta)) * mu_r * r_dot2;

        let v_part = (eta * (15.0 + 4.0 * eta) * v_2 * r_dot)
            - (1.5 * eta * (3.0 + 2.0 * eta) * r_dot2 * r_dot)
            - (0.5 * (4.0 + (41.0 * eta) + 8.0 * (eta * eta)) * mu_r * r_dot);

        n_part * k.n_hat + v_part * k.v
    }
}

impl Acceleration for SecondPn {
    fn acceleration(&self, k: &PairKinematics) -> NVec3 {
        let c4 = 1.0 / (self.c * self.c * self.c * self.c);
        c4 * Self::coefficient(k)
    }
}

/// 2.5PN gravitational radiation reaction, scaled by `c⁻⁵`
///
/// `−(8/15)·η·(μ/r)·[(9v² + 17μ/r)·ṙ·n̂ + (3v² + 9μ/r)·v]`. Always removes
/// orbital energy: `a·v ≤ 0`.
pub struct RadiationReaction {
    pub c: f64,
}

impl RadiationReaction {
    /// `A_2.5PN` without the `c⁻⁵` factor
    pub fn coefficient(k: &PairKinematics) -> NVec3 {
        let n_part = ((9.0 * k.v2) + (17.0 * k.mu_r)) * k.r_dot;
        let v_part = (3.0 * k.v2) + (9.0 * k.mu_r);
        (n_part * k.n_hat + v_part * k.v) * (-(8.0 / 15.0) * k.eta * k.mu_r)
    }
}

impl Acceleration for RadiationReaction {
    fn acceleration(&self, k: &PairKinematics) -> NVec3 {
        let c = self.c;
        let c5 = 1.0 / (c * c * c * c * c);
        c5 * Self::coefficient(k)
    }

    fn is_dissipative(&self) -> bool {
        true
    }
}

/// Collection of bracket terms (Newtonian, 1PN, 2PN, 2.5PN)
/// Contributions are summed in insertion order and scaled by `μ/r²`
pub struct AccelSet {
    g: f64,
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty set with gravitational constant `g`
    pub fn new(g: f64) -> Self {
        Self {
            g,
            terms: Vec::new(),
        }
    }

    /// Add a term
    pub fn with(mut self, term: impl Acceleration + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Newtonian gravity plus the selected PN orders, in AU/yr/M☉ units
    pub fn with_orders(pn1: bool, pn2: bool, pn25: bool) -> Self {
        let mut set = Self::new(G).with(Newtonian);
        if pn1 {
            set = set.with(FirstPn { c: C });
        }
        if pn2 {
            set = set.with(SecondPn { c: C });
        }
        if pn25 {
            set = set.with(RadiationReaction { c: C });
        }
        set
    }

    /// Full model through 2.5PN
    pub fn post_newtonian() -> Self {
        Self::with_orders(true, true, true)
    }

    /// Newtonian + 1PN + 2PN
    pub fn conservative() -> Self {
        Self::with_orders(true, true, false)
    }

    /// Radiation reaction alone, without the Newtonian term
    pub fn dissipative() -> Self {
        Self::new(G).with(RadiationReaction { c: C })
    }

    /// Plain Newtonian gravity (the c → ∞ limit)
    pub fn newtonian() -> Self {
        Self::with_orders(false, false, false)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn has_dissipation(&self) -> bool {
        self.terms.iter().any(|t| t.is_dissipative())
    }

    /// Relative acceleration of body 1 with respect to body 2
    pub fn relative_acceleration(
        &self,
        pos1: NVec3,
        pos2: NVec3,
        vel1: NVec3,
        vel2: NVec3,
        m1: f64,
        m2: f64,
    ) -> SimResult<NVec3> {
        let k = PairKinematics::new(pos1, pos2, vel1, vel2, m1, m2, self.g)?;
        Ok(self.accumulate(&k))
    }

    /// Same as [`relative_acceleration`](Self::relative_acceleration), reading a state matrix
    pub fn relative_acceleration_of(&self, y: &StateMatrix, m1: f64, m2: f64) -> SimResult<NVec3> {
        let k = PairKinematics::from_state(y, m1, m2, self.g)?;
        Ok(self.accumulate(&k))
    }

    fn accumulate(&self, k: &PairKinematics) -> NVec3 {
        let mut bracket = NVec3::zeros();
        for term in &self.terms {
            bracket += term.acceleration(k);
        }
        (k.mu / (k.r * k.r)) * bracket
    }
}

/// Full post-Newtonian relative acceleration (through 2.5PN)
pub fn pn_acceleration(pos1: NVec3, pos2: NVec3, vel1: NVec3, vel2: NVec3, m1: f64, m2: f64) -> SimResult<NVec3> {
    AccelSet::post_newtonian().relative_acceleration(pos1, pos2, vel1, vel2, m1, m2)
}

/// Split a relative acceleration into per-body accelerations
///
/// `a1 = (m2/m)·a_rel`, `a2 = −(m1/m)·a_rel`, so `m1·a1 + m2·a2 = 0`.
/// Only valid while no terms beyond 2.5PN are in the model.
pub fn resolve_individual_accelerations(a_rel: NVec3, m1: f64, m2: f64) -> (NVec3, NVec3) {
    let m = m1 + m2;
    let a1 = (m2 / m) * a_rel;
    let a2 = -((m1 / m) * a_rel);
    (a1, a2)
}
