use thiserror::Error;

use crate::parameters::bounds::BoundsError;

/// Error types for the lsqfit-rs library.
#[derive(Error, Debug)]
pub enum FitError {
    /// Error indicating a mismatch between the lengths of the data sequences
    /// or between the data and the model output.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The observations contain no data points.
    #[error("The data must contain at least one observation")]
    EmptyData,

    /// No fit parameters were given.
    #[error("At least one fit parameter must be given")]
    EmptyParameters,

    /// A parameter name was given more than once.
    #[error("Parameter '{0}' was given more than once")]
    DuplicateParameter(String),

    /// Bounds were given for a parameter that has no initial guess.
    #[error("Bounds given for unknown parameter '{0}'")]
    UnknownBoundParameter(String),

    /// The bounds of a parameter are not a valid interval.
    #[error("Invalid bounds for parameter '{name}': {source}")]
    InvalidBounds {
        /// Name of the offending parameter
        name: String,
        /// What is wrong with the interval
        #[source]
        source: BoundsError,
    },

    /// The data weights can not be normalized.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// An initial guess is NaN or infinite.
    #[error("Initial guess for parameter '{0}' is not finite")]
    NonFiniteGuess(String),

    /// Error during model evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// The solver did not reach a solution. The whole fit fails.
    #[error("Solver '{backend}' failed after {evaluations} evaluations: {reason}")]
    SolverFailure {
        /// Name of the solver backend
        backend: String,
        /// Termination reason reported by the backend
        reason: String,
        /// Number of objective evaluations performed
        evaluations: usize,
    },

    /// The solution holds no value for the parameter.
    #[error("No value for parameter '{0}' in the solution")]
    ValueNotFound(String),

    /// Not implemented functionality.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for lsqfit-rs operations.
pub type Result<T> = std::result::Result<T, FitError>;
