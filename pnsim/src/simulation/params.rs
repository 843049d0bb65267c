//! Numerical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - integrator tolerances and initial step size,
//! - the fixed physics tick and wall-clock speed-up,
//! - the rejection cap and edit-history cap

#[derive(Debug, Clone)]
pub struct Parameters {
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
    pub h0: f64, // initial sub-step size (years)
    pub max_rejections: u32, // consecutive rejections before a crash
    pub physics_dt: f64, // fixed macro-step per physics tick (years)
    pub sim_speed: f64, // simulated years per wall-clock second
    pub frame_ms: u64, // physics thread sleep between frames
    pub history_cap: usize, // max edit-history entries
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            atol: 1.0e-8,
            rtol: 1.0e-10,
            h0: 0.05,
            max_rejections: 50,
            physics_dt: 0.033,
            sim_speed: 1.0,
            frame_ms: 33,
            history_cap: 20,
        }
    }
}
