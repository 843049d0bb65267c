//! Build fully-initialized two-body scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime bundle
//! containing:
//! - numerical parameters (`Parameters`)
//! - the two bodies at t = 0
//! - the active force set (`AccelSet`)
//!
//! [`Scenario::build_engine`] then wires the bundle into the shared
//! buffer box, the controller and the physics engine.

use std::f64::consts::PI;
use std::sync::Arc;

use tracing::info;

use crate::configuration::config::{BodyConfig, ScenarioConfig};
use crate::error::{SimError, SimResult};
use crate::simulation::controller::SimulationController;
use crate::simulation::engine::Engine;
use crate::simulation::exchange::BufferBox;
use crate::simulation::forces::AccelSet;
use crate::simulation::integrator::Rk45;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec3, Snapshot};

pub struct Scenario {
    pub parameters: Parameters,
    pub bodies: [Body; 2],
    pub forces: AccelSet,
    pub headless_years: Option<f64>,
}

fn positive(name: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::config(format!("{name} must be positive and finite, got {value}")))
    }
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> SimResult<Self> {
        let [c1, c2]: [BodyConfig; 2] = cfg
            .bodies
            .try_into()
            .map_err(|b: Vec<BodyConfig>| SimError::config(format!("exactly two bodies required, got {}", b.len())))?;

        // Validate through the same path user edits take
        let snap = Snapshot {
            positions: [NVec3::from(c1.x), NVec3::from(c2.x)],
            velocities: [NVec3::from(c1.v), NVec3::from(c2.v)],
            masses: [c1.m, c2.m],
        };
        snap.validate().map_err(|e| SimError::config(e.to_string()))?;

        let p_cfg = cfg.parameters;
        let e_cfg = cfg.engine;
        if p_cfg.max_rejections == 0 {
            return Err(SimError::config("max_rejections must be at least 1"));
        }
        if p_cfg.history_cap == 0 {
            return Err(SimError::config("history_cap must be at least 1"));
        }
        let parameters = Parameters {
            atol: positive("atol", p_cfg.atol)?,
            rtol: positive("rtol", p_cfg.rtol)?,
            h0: positive("h0", p_cfg.h0)?,
            max_rejections: p_cfg.max_rejections,
            physics_dt: positive("physics_dt", e_cfg.physics_dt)?,
            sim_speed: positive("sim_speed", e_cfg.sim_speed)?,
            frame_ms: e_cfg.frame_ms,
            history_cap: p_cfg.history_cap,
        };
        if let Some(years) = e_cfg.headless_years {
            positive("headless_years", years)?;
        }

        let f = cfg.forces;
        let forces = AccelSet::with_orders(f.pn1, f.pn2, f.pn25);

        info!(
            m1 = snap.masses[0],
            m2 = snap.masses[1],
            pn1 = f.pn1,
            pn2 = f.pn2,
            pn25 = f.pn25,
            "scenario built"
        );

        Ok(Self {
            parameters,
            bodies: snap.bodies(),
            forces,
            headless_years: e_cfg.headless_years,
        })
    }

    /// Sun and Earth on a circular 1 AU orbit, full PN model
    pub fn sun_earth() -> Self {
        let sun = Body::new(NVec3::zeros(), NVec3::zeros(), 1.0);
        let earth = Body::new(NVec3::new(1.0, 0.0, 0.0), NVec3::new(0.0, 2.0 * PI, 0.0), 3.003e-6);
        Self {
            parameters: Parameters::default(),
            bodies: [sun, earth],
            forces: AccelSet::post_newtonian(),
            headless_years: None,
        }
    }

    /// Wire up buffers, controller, integrator and physics engine
    pub fn build_engine(self) -> SimResult<Engine> {
        let integrator = Rk45::from_parameters(&self.parameters, self.forces)?;
        let [b1, b2] = self.bodies;
        let buffers = Arc::new(BufferBox::new(b1, b2, self.parameters.history_cap));
        let controller = Arc::new(SimulationController::new());
        Ok(Engine::new(integrator, buffers, controller, &self.parameters))
    }
}
