//! # In-Memory Partitioned Store
//!
//! Reference backend keyed by record id. Writes are upserts, so replaying
//! a data file is idempotent. Pages follow the same contract as a remote
//! store: `limit` bounds the raw items evaluated and a continuation key is
//! returned only when more matching items remain.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::RwLock;

use super::errors::{StoreError, StoreResult};
use super::partitioned::{
    Page, PartitionedStore, QueryRequest, ScanDirection, ScanIndex, ScanRequest,
};
use super::record::{ContinuationKey, Record};

/// Store holding every record in memory
#[derive(Debug, Default)]
pub struct MemoryPartitionedStore {
    records: RwLock<BTreeMap<String, Record>>,
}

impl MemoryPartitionedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from records (later ids overwrite earlier ones)
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self {
            records: RwLock::new(map),
        }
    }

    /// Load a JSON-lines data file, one record per line
    pub fn load_json_lines(path: &Path) -> StoreResult<Self> {
        let file = File::open(path)
            .map_err(|e| StoreError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StoreError::IoError(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record =
                serde_json::from_str(&line).map_err(|e| StoreError::InvalidRecord {
                    line: index + 1,
                    reason: e.to_string(),
                })?;
            records.push(record);
        }

        Ok(Self::from_records(records))
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cut a fully ordered candidate list down to one page
fn paginate(
    candidates: Vec<&Record>,
    limit: usize,
    projection: Option<&Vec<String>>,
) -> Page {
    let limit = limit.max(1);
    let more = candidates.len() > limit;

    let items: Vec<Record> = candidates
        .into_iter()
        .take(limit)
        .map(|r| match projection {
            Some(fields) => r.project(fields),
            None => r.clone(),
        })
        .collect();

    let last_evaluated = if more {
        items.last().map(ContinuationKey::of)
    } else {
        None
    };

    Page {
        items,
        last_evaluated,
    }
}

impl PartitionedStore for MemoryPartitionedStore {
    fn query(&self, request: &QueryRequest) -> StoreResult<Page> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;

        let mut candidates: Vec<&Record> = records
            .values()
            .filter(|r| request.partition.contains(r) && request.range.contains(r))
            .collect();

        candidates.sort_by(|a, b| a.partition_order(b));
        if request.direction == ScanDirection::Backward {
            candidates.reverse();
        }

        if let Some(start) = &request.exclusive_start {
            candidates.retain(|r| match request.direction {
                ScanDirection::Forward => start.cmp_partition(r).is_gt(),
                ScanDirection::Backward => start.cmp_partition(r).is_lt(),
            });
        }

        Ok(paginate(candidates, request.limit, request.projection.as_ref()))
    }

    fn scan(&self, request: &ScanRequest) -> StoreResult<Page> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Internal("Lock poisoned".into()))?;

        let mut candidates: Vec<&Record> = records.values().collect();

        match request.index {
            // BTreeMap iteration is already id order
            ScanIndex::Primary => {
                if let Some(start) = &request.exclusive_start {
                    candidates.retain(|r| r.id > start.id);
                }
            }
            ScanIndex::CaptureDate => {
                candidates.sort_by(|a, b| a.capture_date_order(b));
                if let Some(start) = &request.exclusive_start {
                    candidates.retain(|r| start.cmp_capture_date(r).is_gt());
                }
            }
        }

        Ok(paginate(candidates, request.limit, request.projection.as_ref()))
    }
}
