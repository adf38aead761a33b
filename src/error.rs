//! Domain errors for the closure simulation.

use thiserror::Error;

/// Errors surfaced by the simulation and its configuration.
///
/// I/O and parse failures while loading datasets travel as `anyhow::Error`;
/// these variants can be recovered from it with `downcast_ref`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Post office with id {id} not found")]
    NotFound { id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SimulationError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        SimulationError::InvalidConfiguration(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
