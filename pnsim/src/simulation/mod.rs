pub mod states;
pub mod params;
pub mod forces;
pub mod integrator;
pub mod history;
pub mod exchange;
pub mod controller;
pub mod engine;
pub mod scenario;
