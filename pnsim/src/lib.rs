pub mod error;
pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use error::{SimError, SimResult};

pub use simulation::states::{Body, NVec3, SimState, Snapshot, StateMatrix};
pub use simulation::forces::{pn_acceleration, resolve_individual_accelerations, Acceleration, AccelSet, G, C};
pub use simulation::integrator::{Rk45, StepReport};
pub use simulation::history::EditHistory;
pub use simulation::exchange::{BufferBox, FrontBuffer};
pub use simulation::controller::SimulationController;
pub use simulation::engine::{Engine, RunStats, TickOutcome};
pub use simulation::params::Parameters;
pub use simulation::scenario::Scenario;

pub use configuration::config::{BodyConfig, EngineConfig, ForcesConfig, ParametersConfig, ScenarioConfig};

pub use visualization::viewer::run_viewer;

pub use benchmark::benchmark::{bench_forces, bench_rk45_tolerances};
