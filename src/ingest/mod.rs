//! Checkpointed ingestion
//!
//! A standalone polling loop that replays new records from the
//! partitioned store into a downstream sink and persists a high-water
//! mark after every batch.

mod engine;
mod errors;
mod sink;

pub use engine::{IngestionEngine, SyncMode, SyncReport};
pub use errors::{IngestError, IngestResult, SinkError};
pub use sink::{MemorySink, RecordSink};
