//! # Graph Statement Errors

use thiserror::Error;

/// Result type for graph statement operations
pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// Statement text references a parameter that was never bound
    #[error("Unbound statement parameter: ${0}")]
    UnboundParameter(String),

    /// A bound parameter does not appear in the statement text
    #[error("Unused statement parameter: ${0}")]
    UnusedParameter(String),

    /// Parameter name is not a valid identifier
    #[error("Invalid parameter name: {0}")]
    InvalidParameterName(String),

    /// Executor could not apply the statement
    #[error("Statement execution failed: {0}")]
    Execution(String),

    /// A built-in pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Configured UTC offset is out of range
    #[error("Invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(String),
}
