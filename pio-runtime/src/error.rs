//! Runtime error types
//!
//! Nothing fails while stepping; these cover setup and block management.

use pio_spec::{ConfigError, SpecError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("PIO block already holds {capacity} state machines")]
    CapacityExceeded { capacity: usize },

    #[error("Invalid configuration: {0}")]
    Config(ConfigError),

    #[error("No state machine at index {0}")]
    InvalidStateMachine(usize),

    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
