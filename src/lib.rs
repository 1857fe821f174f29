//! captureline - time-partitioned timelines for camera captures
//!
//! Two independent engines over the same partitioned store:
//!
//! - [`ingest::IngestionEngine`] backfills and then incrementally follows the
//!   store from a durable checkpoint, feeding a downstream sink.
//! - [`pagination::PaginationAggregator`] serves newest-first / oldest-first
//!   pages across calendar-day partitions with resumable cursors.

pub mod checkpoint;
pub mod cli;
pub mod clock;
pub mod config;
pub mod filter;
pub mod graph;
pub mod ingest;
pub mod observability;
pub mod pagination;
pub mod store;
