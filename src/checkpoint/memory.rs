//! # In-Memory Checkpoint Store

use std::collections::HashMap;
use std::sync::RwLock;

use super::backend::CheckpointStore;
use super::errors::{CheckpointError, CheckpointResult};

/// Checkpoint backend held in memory.
///
/// Every successful `put` is also appended to a history so callers can
/// inspect the sequence of persisted values.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    history: RwLock<Vec<(String, Vec<u8>)>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blobs written so far, oldest first
    pub fn history(&self) -> Vec<(String, Vec<u8>)> {
        self.history.read().map(|h| h.clone()).unwrap_or_default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, name: &str) -> CheckpointResult<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| CheckpointError::read_failed("Lock poisoned"))?;
        Ok(blobs.get(name).cloned())
    }

    fn put(&self, name: &str, data: &[u8]) -> CheckpointResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| CheckpointError::write_failed("Lock poisoned"))?;
        let mut history = self
            .history
            .write()
            .map_err(|_| CheckpointError::write_failed("Lock poisoned"))?;

        blobs.insert(name.to_string(), data.to_vec());
        history.push((name.to_string(), data.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_and_history() {
        let store = MemoryCheckpointStore::new();
        assert_eq!(store.get("cp").unwrap(), None);

        store.put("cp", b"1").unwrap();
        store.put("cp", b"2").unwrap();

        assert_eq!(store.get("cp").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.history().len(), 2);
    }
}
