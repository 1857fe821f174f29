//! # Checkpoint Store Trait

use std::fmt;

use super::errors::CheckpointResult;

/// Durable blob storage keyed by a fixed name.
///
/// `get` returns `Ok(None)` only when the blob does not exist. Any other
/// failure must surface as an error so callers never mistake an outage
/// for a fresh start.
pub trait CheckpointStore: Send + Sync + fmt::Debug {
    /// Read the blob stored under `name`
    fn get(&self, name: &str) -> CheckpointResult<Option<Vec<u8>>>;

    /// Durably replace the blob stored under `name`
    fn put(&self, name: &str, data: &[u8]) -> CheckpointResult<()>;
}
