//! Error type shared by every stage of the particle filter.

use thiserror::Error;

/// Errors raised while configuring, fitting or querying an SMC session.
///
/// None of these are transient: they describe structural or numerical problems
/// with the inputs, so callers should not retry. A failing call never mutates
/// the session it was invoked on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SmcError {
    /// Invalid option values, a degenerate label set or a zero feature count.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Row counts, feature counts or label sets disagree.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Weights could not be normalized (no finite score) or are otherwise invalid.
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// The session is not in a phase that allows the requested operation.
    #[error("Invalid state: {0}")]
    State(String),

    /// Time keys are missing or were never seen during the time-indexed fit.
    #[error("Time key error: {0}")]
    TimeKey(String),

    /// Writing diagnostics to disk failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SmcError>;

impl From<ndarray::ShapeError> for SmcError {
    fn from(e: ndarray::ShapeError) -> Self {
        SmcError::ShapeMismatch(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for SmcError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SmcError::Configuration(format!("failed to build worker pool: {e}"))
    }
}

impl From<std::io::Error> for SmcError {
    fn from(e: std::io::Error) -> Self {
        SmcError::Io(e.to_string())
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for SmcError {
    fn from(e: csv::Error) -> Self {
        SmcError::Io(e.to_string())
    }
}
