//! Observable lifecycle events
//!
//! Every lifecycle log line carries one of these names in its `event`
//! field so log pipelines can match on a stable vocabulary.

use std::fmt;

/// Observable events in captureline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Polling loop started
    IngestLoopStart,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Ingestion cycle
    /// One sync cycle begins
    IngestCycleBegin,
    /// One sync cycle finished
    IngestCycleComplete,
    /// One sync cycle failed
    IngestCycleFailed,

    // Bootstrap
    /// No checkpoint; full backfill is about to start
    BootstrapPending,
    /// Full backfill begins
    BootstrapBegin,
    /// Full backfill complete, initial checkpoint derived
    BootstrapComplete,

    // Catch-up
    /// One incremental batch delivered
    CatchupBatch,
    /// Record rejected by the sink and skipped
    RecordSkipped,
    /// Checkpoint date force-advanced past a quiet partition
    PartitionStallAdvanced,

    // Checkpoint
    /// Checkpoint read
    CheckpointLoaded,
    /// No checkpoint blob exists
    CheckpointMissing,
    /// Checkpoint blob exists but cannot be parsed
    CheckpointCorrupt,
    /// Checkpoint durably written
    CheckpointPersisted,

    // Pagination
    /// Page request received
    PageRequestBegin,
    /// Page request answered
    PageRequestComplete,
    /// Page request failed
    PageRequestFailed,
    /// Walk moved to the previous day
    PartitionRollover,
    /// Walk stopped by a work bound
    PaginationGuardReached,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::IngestLoopStart => "INGEST_LOOP_START",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::IngestCycleBegin => "INGEST_CYCLE_BEGIN",
            Event::IngestCycleComplete => "INGEST_CYCLE_COMPLETE",
            Event::IngestCycleFailed => "INGEST_CYCLE_FAILED",

            Event::BootstrapPending => "BOOTSTRAP_PENDING",
            Event::BootstrapBegin => "BOOTSTRAP_BEGIN",
            Event::BootstrapComplete => "BOOTSTRAP_COMPLETE",

            Event::CatchupBatch => "CATCHUP_BATCH",
            Event::RecordSkipped => "RECORD_SKIPPED",
            Event::PartitionStallAdvanced => "PARTITION_STALL_ADVANCED",

            Event::CheckpointLoaded => "CHECKPOINT_LOADED",
            Event::CheckpointMissing => "CHECKPOINT_MISSING",
            Event::CheckpointCorrupt => "CHECKPOINT_CORRUPT",
            Event::CheckpointPersisted => "CHECKPOINT_PERSISTED",

            Event::PageRequestBegin => "PAGE_REQUEST_BEGIN",
            Event::PageRequestComplete => "PAGE_REQUEST_COMPLETE",
            Event::PageRequestFailed => "PAGE_REQUEST_FAILED",
            Event::PartitionRollover => "PARTITION_ROLLOVER",
            Event::PaginationGuardReached => "PAGINATION_GUARD_REACHED",
        }
    }

    /// Events that indicate the operation did not complete
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::IngestCycleFailed | Event::PageRequestFailed | Event::CheckpointCorrupt
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        for event in [
            Event::IngestCycleBegin,
            Event::BootstrapPending,
            Event::PartitionStallAdvanced,
            Event::PaginationGuardReached,
        ] {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
            assert_eq!(event.to_string(), name);
        }
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::IngestCycleFailed.is_failure());
        assert!(!Event::CheckpointPersisted.is_failure());
    }
}
