//! Cursor pagination over partitioned captures
//!
//! Callers select a date or camera partition and get pages of records,
//! newest first by default. A page that stops short of exhaustion carries
//! a cursor; handing it back continues the walk, across day boundaries
//! for older-date walks.
//!
//! # Usage
//!
//! ```ignore
//! let aggregator = PaginationAggregator::new(store, catalog, config.pagination);
//! let first = aggregator.fetch(&PageRequest::date(None).num_results(20))?;
//! if let Some(cursor) = first.last_evaluated_key {
//!     let next = aggregator.fetch(&PageRequest::date(None).num_results(20).cursor(cursor))?;
//! }
//! ```

mod aggregator;
mod cursor;
mod errors;
mod request;
mod response;

pub use aggregator::PaginationAggregator;
pub use cursor::{Cursor, Direction};
pub use errors::{PaginationError, PaginationResult};
pub use request::{Bound, PageRequest, PartitionSelector};
pub use response::{PageResponse, StopReason};
