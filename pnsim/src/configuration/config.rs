//! Configuration types for loading two-body scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`EngineConfig`]     – physics tick, wall-clock speed-up, headless run length
//! - [`ParametersConfig`] – integrator tolerances, rejection cap, history size
//! - [`ForcesConfig`]     – which post-Newtonian orders are switched on
//! - [`BodyConfig`]       – initial state for each of the two bodies
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! Units are AU, years and solar masses:
//!
//! ```yaml
//! engine:
//!   physics_dt: 0.033      # fixed macro-step per physics tick (yr)
//!   sim_speed: 1.0         # simulated years per wall-clock second
//!   frame_ms: 33           # physics thread sleep between frames
//!
//! parameters:
//!   atol: 1.0e-8
//!   rtol: 1.0e-10
//!   h0: 0.05               # initial sub-step (yr)
//!   max_rejections: 50
//!   history_cap: 20
//!
//! forces:
//!   pn1: true
//!   pn2: true
//!   pn25: true
//!
//! bodies:
//!   - x: [0.0, 0.0, 0.0]
//!     v: [0.0, 0.0, 0.0]
//!     m: 1.0
//!   - x: [1.0, 0.0, 0.0]
//!     v: [0.0, 6.283185307179586, 0.0]
//!     m: 3.003e-6
//! ```
//!
//! Every section except `bodies` may be omitted and falls back to defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::SimResult;
use crate::simulation::params::Parameters;

/// Physics-thread pacing
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub physics_dt: f64, // fixed macro-step per tick (yr)
    pub sim_speed: f64, // simulated years per wall-clock second
    pub frame_ms: u64, // sleep between physics frames
    pub headless_years: Option<f64>, // run without a window for this long
}

impl Default for EngineConfig {
    fn default() -> Self {
        let p = Parameters::default();
        Self {
            physics_dt: p.physics_dt,
            sim_speed: p.sim_speed,
            frame_ms: p.frame_ms,
            headless_years: None,
        }
    }
}

/// Integrator and history settings
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub atol: f64, // absolute error tolerance
    pub rtol: f64, // relative error tolerance
    pub h0: f64, // initial sub-step size
    pub max_rejections: u32, // consecutive rejections before a crash
    pub history_cap: usize, // undo/redo depth
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let p = Parameters::default();
        Self {
            atol: p.atol,
            rtol: p.rtol,
            h0: p.h0,
            max_rejections: p.max_rejections,
            history_cap: p.history_cap,
        }
    }
}

/// Post-Newtonian orders on top of Newtonian gravity
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ForcesConfig {
    pub pn1: bool,
    pub pn2: bool,
    pub pn25: bool, // radiation reaction
}

impl Default for ForcesConfig {
    fn default() -> Self {
        Self {
            pn1: true,
            pn2: true,
            pn25: true,
        }
    }
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: [f64; 3], // position (AU)
    pub v: [f64; 3], // velocity (AU/yr)
    pub m: f64,      // mass (M☉)
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub forces: ForcesConfig,
    pub bodies: Vec<BodyConfig>, // exactly two
}

impl ScenarioConfig {
    pub fn from_yaml_str(s: &str) -> SimResult<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }
}
