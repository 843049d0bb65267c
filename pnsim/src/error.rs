//! Error types for the two-body engine
//!
//! Everything fallible in the library returns [`SimResult`]. Errors never
//! cross the physics/render thread boundary: the physics thread turns an
//! integration crash into a flag on the controller instead.

use thiserror::Error;

/// Result alias used across the crate
pub type SimResult<T> = Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Bodies coincide (r == 0) or the separation is not finite
    #[error("singular separation between bodies (r = {separation:e})")]
    SingularSeparation { separation: f64 },

    /// Total mass is zero, negative or not finite
    #[error("degenerate masses m1 = {m1:e}, m2 = {m2:e}: total mass must be positive")]
    DegenerateMass { m1: f64, m2: f64 },

    /// Too many consecutive rejected sub-steps inside one macro-step
    #[error("integration crashed after {rejections} consecutive rejections at t = {time_reached:e}")]
    IntegrationCrash { rejections: u32, time_reached: f64 },

    /// Macro-step length negative or not finite
    #[error("invalid integration interval dt = {requested_dt:e}")]
    InvalidInterval { requested_dt: f64 },

    /// User edit rejected, previous value retained
    #[error("invalid edit of {field}: {reason}")]
    InvalidEdit { field: String, reason: String },

    /// Scenario configuration failed validation
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_edit(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEdit {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
