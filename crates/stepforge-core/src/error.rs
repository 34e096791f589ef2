//! Error types for StepForge

use thiserror::Error;

/// Main error type for StepForge operations
#[derive(Debug, Error)]
pub enum SolverError {
    /// Execution fault recorded by the driver, tagged with the failing solver
    #[error("{solver} error: {message}")]
    Step { solver: String, message: String },

    /// Fault raised from inside an algorithm hook
    #[error("{0}")]
    Fault(String),

    /// Capability the concrete solver does not provide
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// A stage input read an output that has not been produced
    #[error("stage output '{0}' is not available")]
    MissingStageOutput(String),

    /// An operation named a stage the pipeline does not define
    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    /// Invalid operation for current solver state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Export data could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SolverError {
    /// Creates a fault from any displayable message.
    pub fn fault(message: impl Into<String>) -> Self {
        SolverError::Fault(message.into())
    }

    /// Attributes this error to `solver`, unless it already names a solver.
    pub fn attributed_to(self, solver: &str) -> Self {
        match self {
            SolverError::Step { .. } => self,
            other => SolverError::Step {
                solver: solver.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias for StepForge operations
pub type Result<T> = std::result::Result<T, SolverError>;
