//! CLI-specific error types
//!
//! Every subsystem error reaching the CLI is mapped to one code. All CLI
//! errors end the process with a non-zero exit status.

use std::fmt;
use std::io;

use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::graph::GraphError;
use crate::ingest::IngestError;
use crate::pagination::PaginationError;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Components could not be built
    BootFailed,
    /// Request parameters rejected
    InvalidRequest,
    /// Record store failure
    StoreError,
    /// Checkpoint backend failure
    CheckpointError,
    /// Ingestion cycle failure
    IngestFailed,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CAPTURELINE_CLI_CONFIG_ERROR",
            Self::IoError => "CAPTURELINE_CLI_IO_ERROR",
            Self::BootFailed => "CAPTURELINE_CLI_BOOT_FAILED",
            Self::InvalidRequest => "CAPTURELINE_CLI_INVALID_REQUEST",
            Self::StoreError => "CAPTURELINE_CLI_STORE_ERROR",
            Self::CheckpointError => "CAPTURELINE_CLI_CHECKPOINT_ERROR",
            Self::IngestFailed => "CAPTURELINE_CLI_INGEST_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::StoreError, e.to_string())
    }
}

impl From<FilterError> for CliError {
    fn from(e: FilterError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<GraphError> for CliError {
    fn from(e: GraphError) -> Self {
        Self::boot_failed(e.to_string())
    }
}

impl From<CheckpointError> for CliError {
    fn from(e: CheckpointError) -> Self {
        Self::new(CliErrorCode::CheckpointError, e.to_string())
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        Self::new(CliErrorCode::IngestFailed, e.to_string())
    }
}

impl From<PaginationError> for CliError {
    fn from(e: PaginationError) -> Self {
        match e {
            PaginationError::Store(store) => store.into(),
            other => Self::invalid_request(other.to_string()),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_errors_split_by_blame() {
        let caller: CliError = PaginationError::InvalidDate("May".into()).into();
        assert_eq!(caller.code(), &CliErrorCode::InvalidRequest);

        let store: CliError = PaginationError::Store(StoreError::Unavailable("down".into())).into();
        assert_eq!(store.code_str(), "CAPTURELINE_CLI_STORE_ERROR");
    }

    #[test]
    fn test_display_has_code() {
        let err = CliError::config_error("missing store");
        assert_eq!(err.to_string(), "CAPTURELINE_CLI_CONFIG_ERROR: missing store");
    }
}
