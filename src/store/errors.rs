//! # Partitioned Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a partitioned store backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Backend rejected the request because of rate limits
    #[error("Store throttled: {0}")]
    Throttled(String),

    /// Backend did not answer in time or is unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Request is not valid for this store
    #[error("Invalid store request: {0}")]
    InvalidRequest(String),

    /// A record in a data file could not be decoded
    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(String),

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether a caller may retry the same request with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Throttled(_) | StoreError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Throttled("slow down".into()).is_transient());
        assert!(StoreError::Unavailable("timeout".into()).is_transient());
        assert!(!StoreError::InvalidRequest("limit".into()).is_transient());
        assert!(!StoreError::Internal("poisoned".into()).is_transient());
    }
}
