//! # Filter Errors

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Filter configuration and lookup errors.
///
/// All of these are caller or configuration errors. Evaluation itself
/// cannot fail once a definition has compiled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// Operator name is not one of `contains`, `not_contains`, `in`
    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    /// Value does not have the shape the operator needs
    #[error("Invalid value for '{operator}': {reason}")]
    InvalidValue { operator: String, reason: String },

    /// Named filter is not in the catalog
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// Catalog document cannot be decoded
    #[error("Invalid filter catalog: {0}")]
    InvalidCatalog(String),

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(String),
}
