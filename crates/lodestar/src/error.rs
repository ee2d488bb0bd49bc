//! # Engine Error Types
//!
//! Errors surfaced by the game-facing layer: everything the ECS can return,
//! plus configuration problems.

use lodestar_core::EcsError;
use thiserror::Error;

/// Errors that can occur while configuring or running the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An ECS operation failed.
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// A configuration value is out of range or the document is malformed.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
