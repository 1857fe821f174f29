//! # Partitioned Store Trait
//!
//! The store answers range queries inside exactly one partition and full
//! scans of an index. Both return bounded pages; a page carries a
//! continuation key only when more data remains for the same request.

use std::fmt;

use super::errors::StoreResult;
use super::record::{ContinuationKey, PartitionKey, Record};

/// Traversal order of the sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Ascending sort keys
    Forward,
    /// Descending sort keys
    Backward,
}

/// Sort-key condition of a query.
///
/// The `*Key` variants bound on the full partition order `(sort_key, id)`,
/// so records sharing a sort key on both sides of the bound are kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortRange {
    /// Whole partition
    All,
    /// Strictly greater than
    After(i64),
    /// Strictly less than
    Before(i64),
    /// Strictly after `(sort_key, id)`
    AfterKey { sort_key: i64, id: String },
    /// Strictly before `(sort_key, id)`
    BeforeKey { sort_key: i64, id: String },
}

impl SortRange {
    pub fn contains(&self, record: &Record) -> bool {
        let position = (record.sort_key, record.id.as_str());
        match self {
            SortRange::All => true,
            SortRange::After(bound) => record.sort_key > *bound,
            SortRange::Before(bound) => record.sort_key < *bound,
            SortRange::AfterKey { sort_key, id } => position > (*sort_key, id.as_str()),
            SortRange::BeforeKey { sort_key, id } => position < (*sort_key, id.as_str()),
        }
    }
}

/// Index walked by a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanIndex {
    /// Primary key order
    Primary,
    /// `(capture_date, event_ts)` order
    CaptureDate,
}

/// A single-partition range query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub partition: PartitionKey,
    pub range: SortRange,
    pub direction: ScanDirection,
    pub limit: usize,
    pub exclusive_start: Option<ContinuationKey>,
    pub projection: Option<Vec<String>>,
}

impl QueryRequest {
    /// Query the whole partition, newest first, one item
    pub fn new(partition: PartitionKey) -> Self {
        Self {
            partition,
            range: SortRange::All,
            direction: ScanDirection::Backward,
            limit: 1,
            exclusive_start: None,
            projection: None,
        }
    }

    pub fn range(mut self, range: SortRange) -> Self {
        self.range = range;
        self
    }

    pub fn direction(mut self, direction: ScanDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn start_after(mut self, key: Option<ContinuationKey>) -> Self {
        self.exclusive_start = key;
        self
    }

    pub fn projection(mut self, projection: Option<Vec<String>>) -> Self {
        self.projection = projection;
        self
    }
}

/// A full index scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub index: ScanIndex,
    pub limit: usize,
    pub exclusive_start: Option<ContinuationKey>,
    pub projection: Option<Vec<String>>,
}

impl ScanRequest {
    pub fn new(index: ScanIndex) -> Self {
        Self {
            index,
            limit: 1,
            exclusive_start: None,
            projection: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn start_after(mut self, key: Option<ContinuationKey>) -> Self {
        self.exclusive_start = key;
        self
    }

    pub fn projection(mut self, projection: Option<Vec<String>>) -> Self {
        self.projection = projection;
        self
    }
}

/// One bounded page of results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in request order
    pub items: Vec<Record>,
    /// Present iff more data remains for the same request
    pub last_evaluated: Option<ContinuationKey>,
}

impl Page {
    pub fn is_exhausted(&self) -> bool {
        self.last_evaluated.is_none()
    }
}

/// Backend trait for key/sort-key queryable stores
pub trait PartitionedStore: Send + Sync + fmt::Debug {
    /// Range query within one partition
    fn query(&self, request: &QueryRequest) -> StoreResult<Page>;

    /// Full scan of an index
    fn scan(&self, request: &ScanRequest) -> StoreResult<Page>;
}
