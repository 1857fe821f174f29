//! # Pagination Errors

use thiserror::Error;

use crate::filter::FilterError;
use crate::store::StoreError;

/// Result type for pagination
pub type PaginationResult<T> = Result<T, PaginationError>;

/// Pagination errors.
///
/// A store error aborts the whole request; partial results are never
/// returned without a valid cursor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaginationError {
    // ==================
    // Caller errors
    // ==================
    /// Parameter value cannot be used
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    /// Parameters that exclude each other were both supplied
    #[error("Conflicting parameters: {0}")]
    ConflictingParams(String),

    /// Date partition value cannot be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Cursor cannot be decoded or does not fit the request
    #[error("Malformed cursor: {0}")]
    MalformedCursor(String),

    /// Unknown filter name or invalid filter definition
    #[error("{0}")]
    Filter(#[from] FilterError),

    // ==================
    // Store errors
    // ==================
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PaginationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PaginationError::InvalidParam {
            name,
            reason: reason.into(),
        }
    }

    /// Errors the caller must fix; retrying the same request cannot help
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, PaginationError::Store(_))
    }
}
