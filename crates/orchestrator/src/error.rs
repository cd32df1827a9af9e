//! Error type for simulation runs.

use thiserror::Error;

use crate::actors::ActorError;

/// Why a configuration could not be simulated.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Catalog, strategy, or output problem detected before or after the run.
    #[error(transparent)]
    Config(#[from] journeysim_core::Error),

    /// The actor substrate failed mid-run.
    #[error(transparent)]
    Actor(#[from] ActorError),
}

impl SimulationError {
    /// True for problems with the inputs rather than the runtime.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        match self {
            Self::Config(e) => e.is_configuration(),
            Self::Actor(_) => false,
        }
    }
}

/// Result alias for simulation operations.
pub type SimulationResult<T> = std::result::Result<T, SimulationError>;
