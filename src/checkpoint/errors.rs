//! Checkpoint-specific error types
//!
//! Checkpoint errors carry a structured code in
//! `CAPTURELINE_CHECKPOINT_NAME` format. All of them are ERROR severity:
//! a failed read or write fails the current ingestion cycle but never
//! damages the persisted high-water mark.

use std::fmt;
use std::io;

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but the service is healthy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Checkpoint error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointErrorCode {
    /// Backend could not read the checkpoint blob
    ReadFailed,
    /// Backend could not durably write the checkpoint blob
    WriteFailed,
    /// Checkpoint could not be serialized
    EncodeFailed,
    /// Blob exists but is not a valid checkpoint
    Corrupt,
}

impl CheckpointErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointErrorCode::ReadFailed => "CAPTURELINE_CHECKPOINT_READ_FAILED",
            CheckpointErrorCode::WriteFailed => "CAPTURELINE_CHECKPOINT_WRITE_FAILED",
            CheckpointErrorCode::EncodeFailed => "CAPTURELINE_CHECKPOINT_ENCODE_FAILED",
            CheckpointErrorCode::Corrupt => "CAPTURELINE_CHECKPOINT_CORRUPT",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl fmt::Display for CheckpointErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Checkpoint error with full context
#[derive(Debug)]
pub struct CheckpointError {
    code: CheckpointErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl CheckpointError {
    fn new(code: CheckpointErrorCode, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code,
            message: message.into(),
            source,
        }
    }

    /// Creates a read failure without an underlying I/O error
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::new(CheckpointErrorCode::ReadFailed, message, None)
    }

    /// Creates a read failure with source error
    pub fn read_failed_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(CheckpointErrorCode::ReadFailed, message, Some(source))
    }

    /// Creates a write failure without an underlying I/O error
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::new(CheckpointErrorCode::WriteFailed, message, None)
    }

    /// Creates a write failure with source error
    pub fn write_failed_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(CheckpointErrorCode::WriteFailed, message, Some(source))
    }

    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::new(CheckpointErrorCode::EncodeFailed, message, None)
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(CheckpointErrorCode::Corrupt, message, None)
    }

    pub fn code(&self) -> CheckpointErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Corrupt blobs are recovered by bootstrapping; other failures are not
    pub fn is_corrupt(&self) -> bool {
        self.code == CheckpointErrorCode::Corrupt
    }
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;
