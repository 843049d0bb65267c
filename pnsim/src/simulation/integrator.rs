//! Adaptive Dormand–Prince RK5(4) integrator for the two-body state
//!
//! One call to [`Rk45::step`] is a macro-step: the requested interval is
//! covered by as many adaptive sub-steps as needed. Each sub-step evaluates
//! the shared Dormand–Prince stages once and forms both the 5th- and
//! 4th-order solutions from them; their difference drives accept/reject and
//! the step-size update. The 5th-order solution is propagated.

use tracing::warn;

use super::forces::{resolve_individual_accelerations, AccelSet};
use super::params::Parameters;
use super::states::{pack_state, row, SimState, StateMatrix, VEL1, VEL2};
use crate::error::{SimError, SimResult};

// Stage times
pub const C2: f64 = 1.0 / 5.0;
pub const C3: f64 = 3.0 / 10.0;
pub const C4: f64 = 4.0 / 5.0;
pub const C5: f64 = 8.0 / 9.0;
pub const C6: f64 = 1.0;

// Stage weights
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order solution weights (b2 = 0); also the stage-7 abscissa row.
// This row is the one propagated: y_n+1 = y5, and k7 = f(y5) is the next k1
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Embedded 4th-order weights (b2* = 0)
const BS1: f64 = 5179.0 / 57600.0;
const BS3: f64 = 7571.0 / 16695.0;
const BS4: f64 = 393.0 / 640.0;
const BS5: f64 = -92097.0 / 339200.0;
const BS6: f64 = 187.0 / 2100.0;
const BS7: f64 = 1.0 / 40.0;

/// Accept threshold on the normalized error
pub const TOLERANCE: f64 = 1.0;

const SAFETY: f64 = 0.9;
pub const MIN_ADAPT: f64 = 0.1;
pub const MAX_ADAPT: f64 = 5.0;
const ERR_FLOOR: f64 = 1e-16;

/// Number of state components (4 rows x 3 columns)
const N_COMPONENTS: f64 = 12.0;

/// Outcome of one macro-step
#[derive(Debug, Clone, Copy)]
pub struct StepReport {
    pub state: StateMatrix, // last accepted state
    pub count: u32, // sub-step attempts
    pub accepted: u32,
    pub rejected: u32,
    pub streak: u32, // consecutive rejections at the end of the macro-step
    pub mean_step: f64, // mean accepted sub-step size
    pub crashed: bool,
    pub time_reached: f64, // integrated time within this macro-step
}

impl StepReport {
    /// Escalate a crashed macro-step into [`SimError::IntegrationCrash`]
    pub fn into_result(self) -> SimResult<Self> {
        if self.crashed {
            Err(SimError::IntegrationCrash {
                rejections: self.streak,
                time_reached: self.time_reached,
            })
        } else {
            Ok(self)
        }
    }
}

/// Both solutions of one sub-step
struct Substep {
    y5: StateMatrix,
    k7: StateMatrix,
    err_norm: f64,
}

/// Step-size multiplier: `clamp(0.9·(1/(err + ε))^(1/5), 0.1, 5.0)`
///
/// A non-finite error gives the minimum factor.
pub fn adapt_factor(err_norm: f64) -> f64 {
    if !err_norm.is_finite() {
        return MIN_ADAPT;
    }
    let adapt = SAFETY * (1.0 / (err_norm + ERR_FLOOR)).powf(0.2);
    adapt.clamp(MIN_ADAPT, MAX_ADAPT)
}

/// Root-mean-square of the scaled difference between the two solutions
///
/// `e_ij = (y5_ij − y4_ij) / (atol + rtol·max(|y_ij|, |y4_ij|))`
pub fn err_norm(y: &StateMatrix, y4: &StateMatrix, y5: &StateMatrix, atol: f64, rtol: f64) -> f64 {
    let mut sum = 0.0;
    for i in 0..4 {
        for j in 0..3 {
            let scale = atol + rtol * y[(i, j)].abs().max(y4[(i, j)].abs());
            let diff = (y5[(i, j)] - y4[(i, j)]) / scale;
            sum += diff * diff;
        }
    }
    (sum / N_COMPONENTS).sqrt()
}

/// Embedded Dormand–Prince integrator with a carried step size
pub struct Rk45 {
    atol: f64,
    rtol: f64,
    h0: f64, // configured initial step
    h: f64,  // carried between macro-steps
    max_rejections: u32,
    forces: AccelSet,
}

impl Rk45 {
    /// Full post-Newtonian model and the default rejection cap of 50
    ///
    /// Tolerances and the initial step must be positive and finite.
    pub fn new(atol: f64, rtol: f64, initial_dt: f64) -> SimResult<Self> {
        for (name, value) in [("atol", atol), ("rtol", rtol), ("h0", initial_dt)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::config(format!("{name} must be positive and finite, got {value}")));
            }
        }
        Ok(Self {
            atol,
            rtol,
            h0: initial_dt,
            h: initial_dt,
            max_rejections: 50,
            forces: AccelSet::post_newtonian(),
        })
    }

    pub fn from_parameters(params: &Parameters, forces: AccelSet) -> SimResult<Self> {
        Ok(Self::new(params.atol, params.rtol, params.h0)?
            .with_forces(forces)
            .with_max_rejections(params.max_rejections))
    }

    pub fn with_forces(mut self, forces: AccelSet) -> Self {
        self.forces = forces;
        self
    }

    pub fn with_max_rejections(mut self, max_rejections: u32) -> Self {
        self.max_rejections = max_rejections.max(1);
        self
    }

    pub fn step_size(&self) -> f64 {
        self.h
    }

    /// Drop the carried step size, e.g. after an edit replaced the state
    pub fn reset(&mut self) {
        self.h = self.h0;
    }

    /// `dy/dt` for `[pos1, vel1, pos2, vel2]`: `[vel1, a1, vel2, a2]`
    pub fn derivatives(&self, y: &StateMatrix, m1: f64, m2: f64) -> SimResult<StateMatrix> {
        let a_rel = self.forces.relative_acceleration_of(y, m1, m2)?;
        let (a1, a2) = resolve_individual_accelerations(a_rel, m1, m2);
        Ok(pack_state(row(y, VEL1), a1, row(y, VEL2), a2))
    }

    /// Advance `state` by `requested_dt`, sub-stepping adaptively
    ///
    /// Masses are fixed for the whole call. The returned state is always a
    /// value produced by an accepted sub-step (or the input when none was).
    pub fn step(&mut self, state: &SimState, requested_dt: f64) -> SimResult<StepReport> {
        if !(requested_dt.is_finite() && requested_dt >= 0.0) {
            return Err(SimError::InvalidInterval { requested_dt });
        }
        let (m1, m2) = (state.m1, state.m2);
        let total = requested_dt;

        if total == 0.0 {
            return Ok(StepReport {
                state: state.y,
                count: 0,
                accepted: 0,
                rejected: 0,
                streak: 0,
                mean_step: 0.0,
                crashed: false,
                time_reached: 0.0,
            });
        }

        let mut y = state.y;
        let mut k1 = self.derivatives(&y, m1, m2)?;
        let mut h = self.h;
        let mut t = 0.0;

        let (mut count, mut accepted, mut rejected) = (0u32, 0u32, 0u32);
        let mut since_accept = 0u32;
        let mut sum_h = 0.0;
        let mut crashed = false;

        while t < total && !crashed {
            // Never overshoot the macro-step boundary
            let remaining = total - t;
            let truncated = h >= remaining;
            let h_try = if truncated { remaining } else { h };

            let sub = self.substep(&y, &k1, h_try, m1, m2)?;
            let adapt = adapt_factor(sub.err_norm);
            count += 1;

            if sub.err_norm < TOLERANCE {
                t = if truncated { total } else { t + h_try };
                y = sub.y5;
                k1 = sub.k7; // first-same-as-last
                accepted += 1;
                since_accept = 0;
                sum_h += h_try;
                h = if truncated { h.max(h_try * adapt) } else { h_try * adapt };
            } else {
                rejected += 1;
                since_accept += 1;
                h = h_try * adapt;
                if since_accept >= self.max_rejections {
                    crashed = true;
                }
            }
        }

        if crashed {
            warn!(
                rejections = since_accept,
                time_reached = t,
                requested_dt = total,
                "integrator hit the rejection cap, abandoning macro-step"
            );
            self.h = self.h0;
        } else {
            self.h = h;
        }

        Ok(StepReport {
            state: y,
            count,
            accepted,
            rejected,
            streak: since_accept,
            mean_step: if accepted > 0 { sum_h / accepted as f64 } else { 0.0 },
            crashed,
            time_reached: t,
        })
    }

    fn substep(&self, y: &StateMatrix, k1: &StateMatrix, h: f64, m1: f64, m2: f64) -> SimResult<Substep> {
        // k1 = f(y_n), carried over from the previous accepted sub-step
        let k1 = *k1;

        // k2 = f(y_n + h * (1/5 k1))
        let staged = y + h * (A21 * k1);
        let k2 = self.derivatives(&staged, m1, m2)?;

        // k3 = f(y_n + h * (3/40 k1 + 9/40 k2))
        let staged = y + h * (A31 * k1 + A32 * k2);
        let k3 = self.derivatives(&staged, m1, m2)?;

        // k4 at t_n + 4/5 h
        let staged = y + h * (A41 * k1 + A42 * k2 + A43 * k3);
        let k4 = self.derivatives(&staged, m1, m2)?;

        // k5 at t_n + 8/9 h
        let staged = y + h * (A51 * k1 + A52 * k2 + A53 * k3 + A54 * k4);
        let k5 = self.derivatives(&staged, m1, m2)?;

        // k6 at t_n + h
        let staged = y + h * (A61 * k1 + A62 * k2 + A63 * k3 + A64 * k4 + A65 * k5);
        let k6 = self.derivatives(&staged, m1, m2)?;

        // y5 = y_n + h * (35/384 k1 + 500/1113 k3 + 125/192 k4 - 2187/6784 k5 + 11/84 k6)
        let y5 = y + h * (B1 * k1 + B3 * k3 + B4 * k4 + B5 * k5 + B6 * k6);

        // k7 = f(y5), stage 7 sits on the propagated solution
        let k7 = self.derivatives(&y5, m1, m2)?;

        // y4 = y_n + h * (5179/57600 k1 + ... + 1/40 k7), error estimate only
        let y4 = y + h * (BS1 * k1 + BS3 * k3 + BS4 * k4 + BS5 * k5 + BS6 * k6 + BS7 * k7);

        Ok(Substep {
            y5,
            k7,
            err_norm: err_norm(y, &y4, &y5, self.atol, self.rtol),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tableau_rows_sum_to_stage_times() {
        let eps = 1e-14;
        assert!((A21 - C2).abs() < eps);
        assert!((A31 + A32 - C3).abs() < eps);
        assert!((A41 + A42 + A43 - C4).abs() < eps);
        assert!((A51 + A52 + A53 + A54 - C5).abs() < eps);
        assert!((A61 + A62 + A63 + A64 + A65 - C6).abs() < eps);
    }

    #[test]
    fn both_weight_sets_are_consistent() {
        let b: f64 = B1 + B3 + B4 + B5 + B6;
        let bs: f64 = BS1 + BS3 + BS4 + BS5 + BS6 + BS7;
        assert!((b - 1.0).abs() < 1e-14);
        assert!((bs - 1.0).abs() < 1e-14);
    }

    #[test]
    fn adapt_factor_is_clamped() {
        assert_eq!(adapt_factor(0.0), MAX_ADAPT);
        assert_eq!(adapt_factor(1e12), MIN_ADAPT);
        assert_eq!(adapt_factor(f64::NAN), MIN_ADAPT);
        assert_eq!(adapt_factor(f64::INFINITY), MIN_ADAPT);
        let mid = adapt_factor(1.0);
        assert!((mid - SAFETY).abs() < 1e-12);
    }

    #[test]
    fn err_norm_of_identical_solutions_is_zero() {
        let y = StateMatrix::from_element(1.0);
        assert_eq!(err_norm(&y, &y, &y, 1e-8, 1e-10), 0.0);
    }

    #[test]
    fn err_norm_is_rms_over_twelve_components() {
        let y = StateMatrix::zeros();
        let y4 = StateMatrix::zeros();
        let mut y5 = StateMatrix::zeros();
        // one component off by exactly atol -> e = 1 in one of 12 slots
        y5[(0, 0)] = 1e-3;
        let e = err_norm(&y, &y4, &y5, 1e-3, 0.0);
        assert!((e - (1.0f64 / 12.0).sqrt()).abs() < 1e-12);
    }
}
