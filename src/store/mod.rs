//! Partitioned store subsystem
//!
//! The store is an external collaborator: a key/sort-key queryable table
//! with a date index and an entity index. This module defines the trait
//! both engines depend on, the record model, and an in-memory backend.
//!
//! # Contract
//!
//! - `query` never crosses a partition boundary
//! - `limit` bounds the raw items evaluated per page
//! - a continuation key means "more data for this same request"

mod errors;
mod memory;
mod partitioned;
mod record;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryPartitionedStore;
pub use partitioned::{
    Page, PartitionedStore, QueryRequest, ScanDirection, ScanIndex, ScanRequest, SortRange,
};
pub use record::{parse_date, ContinuationKey, PartitionKey, Record, DATE_FORMAT};
