//! # Ingestion Errors

use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::store::StoreError;

/// Result type for ingestion cycles
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors reported by a record sink
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// The record cannot be interpreted; it is skipped
    #[error("Malformed record {id}: {reason}")]
    Malformed { id: String, reason: String },

    /// The downstream write failed; the batch is retried next cycle
    #[error("Sink write failed: {0}")]
    Write(String),
}

impl SinkError {
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        SinkError::Malformed {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Reasons a sync cycle fails.
///
/// A failed cycle never advances the checkpoint past the failing batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("{0}")]
    Sink(#[from] SinkError),

    /// Shutdown was requested before a bootstrap started
    #[error("Bootstrap aborted by shutdown request")]
    Aborted,

    /// The blocking worker running the cycle did not complete
    #[error("Sync worker failed: {0}")]
    Worker(String),
}
