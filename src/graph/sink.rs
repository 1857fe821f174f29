//! Graph-writing record sink and statement executors

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{FixedOffset, Offset, Utc};
use tracing::debug;

use super::errors::{GraphError, GraphResult};
use super::label::{parse_camera, LabelEvent};
use super::statement::{label_statement, Statement};
use crate::config::GraphConfig;
use crate::ingest::{RecordSink, SinkError};
use crate::store::Record;

/// Applies statements to a graph
pub trait StatementExecutor: Send + Sync + fmt::Debug {
    fn execute(&self, statement: &Statement) -> GraphResult<()>;
}

/// Record sink that turns label records into graph merges
#[derive(Debug)]
pub struct GraphSink {
    executor: Arc<dyn StatementExecutor>,
    excluded_cameras: HashSet<String>,
    offset: FixedOffset,
}

impl GraphSink {
    /// Sink with no exclusions and UTC capture times
    pub fn new(executor: Arc<dyn StatementExecutor>) -> Self {
        Self {
            executor,
            excluded_cameras: HashSet::new(),
            offset: Utc.fix(),
        }
    }

    pub fn from_config(
        executor: Arc<dyn StatementExecutor>,
        config: &GraphConfig,
    ) -> GraphResult<Self> {
        super::check_patterns()?;

        let offset = FixedOffset::east_opt(config.utc_offset_minutes * 60)
            .ok_or(GraphError::InvalidOffset(config.utc_offset_minutes))?;

        Ok(Self::new(executor)
            .with_excluded_cameras(config.excluded_cameras.iter().cloned())
            .with_offset(offset))
    }

    pub fn with_excluded_cameras(mut self, cameras: impl IntoIterator<Item = String>) -> Self {
        self.excluded_cameras.extend(cameras);
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    fn is_excluded(&self, record: &Record) -> bool {
        record
            .attribute_str("object_key")
            .and_then(parse_camera)
            .is_some_and(|camera| self.excluded_cameras.contains(camera))
    }
}

impl RecordSink for GraphSink {
    fn process(&self, record: &Record) -> Result<(), SinkError> {
        if self.is_excluded(record) {
            debug!(id = %record.id, "camera excluded from graph");
            return Ok(());
        }

        let event = LabelEvent::from_record(record, self.offset)?;
        let statement = label_statement(&event).map_err(|e| SinkError::Write(e.to_string()))?;

        self.executor
            .execute(&statement)
            .map_err(|e| SinkError::Write(e.to_string()))
    }
}

/// In-memory graph with MERGE semantics.
///
/// Identical statements collapse into one merge, the way MERGE behaves on
/// a real graph.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    merges: RwLock<BTreeMap<String, Statement>>,
    executions: AtomicU64,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct statements applied
    pub fn merges(&self) -> Vec<Statement> {
        self.merges
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total `execute` calls, repeats included
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }
}

impl StatementExecutor for MemoryGraph {
    fn execute(&self, statement: &Statement) -> GraphResult<()> {
        let key = serde_json::to_string(statement).map_err(|e| GraphError::Execution(e.to_string()))?;

        let mut merges = self
            .merges
            .write()
            .map_err(|_| GraphError::Execution("Lock poisoned".into()))?;
        merges.insert(key, statement.clone());
        self.executions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Appends statements as JSON lines for an external driver process
#[derive(Debug)]
pub struct StatementOutbox {
    path: PathBuf,
    lock: Mutex<()>,
}

impl StatementOutbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

impl StatementExecutor for StatementOutbox {
    fn execute(&self, statement: &Statement) -> GraphResult<()> {
        let mut line = serde_json::to_string(statement).map_err(|e| GraphError::Execution(e.to_string()))?;
        line.push('\n');

        let _guard = self
            .lock
            .lock()
            .map_err(|_| GraphError::Execution("Lock poisoned".into()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| GraphError::IoError(format!("{}: {}", self.path.display(), e)))?;

        file.write_all(line.as_bytes())
            .map_err(|e| GraphError::IoError(e.to_string()))?;
        file.sync_data().map_err(|e| GraphError::IoError(e.to_string()))
    }
}
