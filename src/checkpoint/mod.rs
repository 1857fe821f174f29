//! Checkpoint subsystem
//!
//! The ingestion high-water mark is a small JSON blob kept under one fixed
//! name in a durable blob store.
//!
//! # Load semantics
//!
//! - blob absent: no checkpoint
//! - blob unparseable: logged and treated as absent, forcing a bootstrap
//! - backend read failure: error, never treated as absent

mod backend;
mod errors;
mod local;
mod marker;
mod memory;

pub use backend::CheckpointStore;
pub use errors::{CheckpointError, CheckpointErrorCode, CheckpointResult, Severity};
pub use local::LocalCheckpointStore;
pub use marker::Checkpoint;
pub use memory::MemoryCheckpointStore;

use std::sync::Arc;

use tracing::{info, warn};

use crate::observability::Event;

/// Default blob name
pub const DEFAULT_CHECKPOINT_NAME: &str = "status/label_to_graph_checkpoint";

/// Reads and writes the checkpoint blob under a fixed name
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    store: Arc<dyn CheckpointStore>,
    name: String,
}

impl CheckpointManager {
    pub fn new(store: Arc<dyn CheckpointStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the persisted checkpoint
    pub fn load(&self) -> CheckpointResult<Option<Checkpoint>> {
        let Some(blob) = self.store.get(&self.name)? else {
            info!(event = %Event::CheckpointMissing, name = %self.name, "no checkpoint found");
            return Ok(None);
        };

        match Checkpoint::from_json(&blob) {
            Ok(checkpoint) => {
                info!(
                    event = %Event::CheckpointLoaded,
                    max_capture_date = %checkpoint.max_capture_date,
                    max_timestamp = checkpoint.max_timestamp,
                    "checkpoint loaded"
                );
                Ok(Some(checkpoint))
            }
            Err(err) if err.is_corrupt() => {
                warn!(
                    event = %Event::CheckpointCorrupt,
                    name = %self.name,
                    error = %err,
                    "checkpoint unreadable, treating as absent"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Durably write a checkpoint
    pub fn persist(&self, checkpoint: &Checkpoint) -> CheckpointResult<()> {
        let json = checkpoint.to_json()?;
        self.store.put(&self.name, json.as_bytes())?;

        info!(
            event = %Event::CheckpointPersisted,
            max_capture_date = %checkpoint.max_capture_date,
            max_timestamp = checkpoint.max_timestamp,
            "checkpoint persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Debug)]
    struct FailingStore;

    impl CheckpointStore for FailingStore {
        fn get(&self, _name: &str) -> CheckpointResult<Option<Vec<u8>>> {
            Err(CheckpointError::read_failed("backend unavailable"))
        }

        fn put(&self, _name: &str, _data: &[u8]) -> CheckpointResult<()> {
            Err(CheckpointError::write_failed("backend unavailable"))
        }
    }

    fn manager(store: Arc<dyn CheckpointStore>) -> CheckpointManager {
        CheckpointManager::new(store, DEFAULT_CHECKPOINT_NAME)
    }

    #[test]
    fn test_absent_is_none() {
        let manager = manager(Arc::new(MemoryCheckpointStore::new()));
        assert_eq!(manager.load().unwrap(), None);
    }

    #[test]
    fn test_persist_then_load() {
        let store = Arc::new(MemoryCheckpointStore::new());
        let manager = manager(store.clone());
        let checkpoint = Checkpoint::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), 1200);

        manager.persist(&checkpoint).unwrap();

        assert_eq!(manager.load().unwrap(), Some(checkpoint));
        assert_eq!(store.history()[0].0, DEFAULT_CHECKPOINT_NAME);
    }

    #[test]
    fn test_corrupt_is_none() {
        let store = Arc::new(MemoryCheckpointStore::new());
        store.put(DEFAULT_CHECKPOINT_NAME, b"{oops").unwrap();

        assert_eq!(manager(store).load().unwrap(), None);
    }

    #[test]
    fn test_read_failure_is_not_absence() {
        let err = manager(Arc::new(FailingStore)).load().unwrap_err();
        assert_eq!(err.code(), CheckpointErrorCode::ReadFailed);
    }
}
