//! # Local Filesystem Checkpoint Store
//!
//! Blobs live under a root directory; `/` in a name becomes a
//! subdirectory. Writes go to a temporary sibling, are fsynced, then
//! renamed over the target so a crash leaves either the old or the new
//! blob, never a torn one.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::backend::CheckpointStore;
use super::errors::{CheckpointError, CheckpointResult};

/// Filesystem checkpoint backend
#[derive(Debug)]
pub struct LocalCheckpointStore {
    root: PathBuf,
}

impl LocalCheckpointStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn sync_dir(dir: &Path) -> CheckpointResult<()> {
    let handle = OpenOptions::new().read(true).open(dir).map_err(|e| {
        CheckpointError::write_failed_with_source(
            format!("Failed to open checkpoint directory for fsync: {}", dir.display()),
            e,
        )
    })?;

    handle.sync_all().map_err(|e| {
        CheckpointError::write_failed_with_source(
            format!("Failed to fsync checkpoint directory: {}", dir.display()),
            e,
        )
    })
}

impl CheckpointStore for LocalCheckpointStore {
    fn get(&self, name: &str) -> CheckpointResult<Option<Vec<u8>>> {
        let path = self.full_path(name);

        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CheckpointError::read_failed_with_source(
                format!("Failed to read checkpoint: {}", path.display()),
                e,
            )),
        }
    }

    fn put(&self, name: &str, data: &[u8]) -> CheckpointResult<()> {
        let path = self.full_path(name);
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        fs::create_dir_all(&parent).map_err(|e| {
            CheckpointError::write_failed_with_source(
                format!("Failed to create checkpoint directory: {}", parent.display()),
                e,
            )
        })?;

        let tmp_path = path.with_extension("tmp");

        let mut file = File::create(&tmp_path).map_err(|e| {
            CheckpointError::write_failed_with_source(
                format!("Failed to create checkpoint file: {}", tmp_path.display()),
                e,
            )
        })?;

        file.write_all(data).map_err(|e| {
            CheckpointError::write_failed_with_source(
                format!("Failed to write checkpoint file: {}", tmp_path.display()),
                e,
            )
        })?;

        // fsync is mandatory
        file.sync_all().map_err(|e| {
            CheckpointError::write_failed_with_source(
                format!("Failed to fsync checkpoint file: {}", tmp_path.display()),
                e,
            )
        })?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            CheckpointError::write_failed_with_source(
                format!("Failed to replace checkpoint: {}", path.display()),
                e,
            )
        })?;

        sync_dir(&parent)
    }
}
