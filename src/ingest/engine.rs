//! # Ingestion Engine
//!
//! One sync cycle:
//!
//! 1. Load the checkpoint. A read failure fails the cycle.
//! 2. No checkpoint: wait the grace period, scan the whole store into the
//!    sink, derive the initial checkpoint from the capture-date index.
//! 3. Query the checkpoint's day for records after its timestamp, in
//!    batches, persisting the running maximum after every batch.
//! 4. If that day had nothing new and the calendar has moved on, advance
//!    the checkpoint to today.
//!
//! The checkpoint only moves forward. Delivery is at-least-once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use super::errors::{IngestError, IngestResult, SinkError};
use super::sink::RecordSink;
use crate::checkpoint::{Checkpoint, CheckpointManager};
use crate::clock::{Clock, SystemClock};
use crate::config::IngestConfig;
use crate::observability::{Event, MetricsRegistry};
use crate::store::{
    PartitionKey, PartitionedStore, QueryRequest, Record, ScanDirection, ScanIndex, ScanRequest,
    SortRange,
};

const GRACE_TICK: Duration = Duration::from_millis(100);

/// How a cycle found its starting point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// No checkpoint existed; the whole store was replayed
    Bootstrap,
    /// Resumed from a persisted checkpoint
    Incremental,
}

/// Outcome of one sync cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub cycle_id: Uuid,
    pub mode: SyncMode,
    /// Records accepted by the sink
    pub delivered: u64,
    /// Records the sink rejected as malformed
    pub skipped: u64,
    /// Checkpoint writes this cycle
    pub checkpoints_persisted: u64,
    /// Whether the checkpoint date was force-advanced to today
    pub stall_advanced: bool,
    /// Checkpoint in force when the cycle ended
    pub checkpoint: Option<Checkpoint>,
}

impl SyncReport {
    fn new(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            mode: SyncMode::Incremental,
            delivered: 0,
            skipped: 0,
            checkpoints_persisted: 0,
            stall_advanced: false,
            checkpoint: None,
        }
    }
}

/// Checkpointed ingestion from a partitioned store into a record sink.
///
/// Cloning is cheap; clones share the store, sink, checkpoint backend,
/// metrics and abort flag.
#[derive(Debug, Clone)]
pub struct IngestionEngine {
    store: Arc<dyn PartitionedStore>,
    checkpoints: CheckpointManager,
    sink: Arc<dyn RecordSink>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsRegistry>,
    config: IngestConfig,
    abort: Arc<AtomicBool>,
}

impl IngestionEngine {
    pub fn new(
        store: Arc<dyn PartitionedStore>,
        checkpoints: CheckpointManager,
        sink: Arc<dyn RecordSink>,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            checkpoints,
            sink,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(MetricsRegistry::new()),
            config,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Ask a pending bootstrap grace wait to give up
    pub fn request_abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    /// Run one sync cycle
    pub fn sync_once(&self) -> IngestResult<SyncReport> {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("sync", cycle = %cycle_id);
        let _enter = span.enter();

        self.metrics.increment_ingest_cycles();
        info!(event = %Event::IngestCycleBegin, "sync cycle begins");

        let result = self.run_cycle(cycle_id);

        match &result {
            Ok(report) => info!(
                event = %Event::IngestCycleComplete,
                mode = ?report.mode,
                delivered = report.delivered,
                skipped = report.skipped,
                stall_advanced = report.stall_advanced,
                "sync cycle complete"
            ),
            Err(err) => {
                self.metrics.increment_ingest_failures();
                error!(event = %Event::IngestCycleFailed, error = %err, "sync cycle failed");
            }
        }

        result
    }

    fn run_cycle(&self, cycle_id: Uuid) -> IngestResult<SyncReport> {
        let mut report = SyncReport::new(cycle_id);

        let checkpoint = match self.checkpoints.load()? {
            Some(checkpoint) => checkpoint,
            None => {
                report.mode = SyncMode::Bootstrap;
                self.bootstrap(&mut report)?
            }
        };

        self.catch_up(checkpoint, &mut report)?;
        Ok(report)
    }

    fn wait_grace(&self) -> IngestResult<()> {
        let deadline = Instant::now() + self.config.bootstrap_grace();

        loop {
            if self.abort.load(Ordering::SeqCst) {
                return Err(IngestError::Aborted);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(GRACE_TICK.min(deadline - now));
        }
    }

    fn bootstrap(&self, report: &mut SyncReport) -> IngestResult<Checkpoint> {
        warn!(
            event = %Event::BootstrapPending,
            grace_secs = self.config.bootstrap_grace_secs,
            "no checkpoint found, the whole store will be replayed into the sink"
        );
        self.wait_grace()?;

        self.metrics.increment_bootstraps();
        info!(event = %Event::BootstrapBegin, "bootstrap begins");

        let mut start = None;
        loop {
            let request = ScanRequest::new(ScanIndex::Primary)
                .limit(self.config.items_per_batch)
                .start_after(start)
                .projection(self.config.projection.clone());
            let page = self.store.scan(&request)?;

            self.deliver(&page.items, report)?;

            match page.last_evaluated {
                Some(key) => start = Some(key),
                None => break,
            }
        }

        let checkpoint = self.highest_position()?;
        self.persist(&checkpoint, report)?;

        info!(
            event = %Event::BootstrapComplete,
            delivered = report.delivered,
            max_capture_date = %checkpoint.max_capture_date,
            max_timestamp = checkpoint.max_timestamp,
            "bootstrap complete"
        );
        Ok(checkpoint)
    }

    /// Highest `(capture_date, sort_key)` in the store, or `{today, 0}`
    fn highest_position(&self) -> IngestResult<Checkpoint> {
        let mut highest: Option<Checkpoint> = None;
        let mut start = None;

        loop {
            let request = ScanRequest::new(ScanIndex::CaptureDate)
                .limit(self.config.items_per_batch)
                .start_after(start)
                .projection(Some(Vec::new()));
            let page = self.store.scan(&request)?;

            for record in &page.items {
                let position = Checkpoint::at(record);
                highest = Some(highest.map_or(position, |h| h.advance(position)));
            }

            match page.last_evaluated {
                Some(key) => start = Some(key),
                None => break,
            }
        }

        Ok(highest.unwrap_or_else(|| Checkpoint::new(self.clock.today(), 0)))
    }

    fn catch_up(&self, origin: Checkpoint, report: &mut SyncReport) -> IngestResult<()> {
        let mut current = origin;
        let mut start = None;
        let mut first = true;

        loop {
            let request = QueryRequest::new(PartitionKey::Date(origin.max_capture_date))
                .range(SortRange::After(origin.max_timestamp))
                .direction(ScanDirection::Forward)
                .limit(self.config.items_per_batch)
                .start_after(start)
                .projection(self.config.projection.clone());
            let page = self.store.query(&request)?;

            if first && page.items.is_empty() && page.is_exhausted() {
                report.checkpoint = Some(self.advance_if_stalled(current, report)?);
                return Ok(());
            }
            first = false;

            if let Some(batch_max) = self.deliver(&page.items, report)? {
                current = current.advance(batch_max);
                self.persist(&current, report)?;
                info!(
                    event = %Event::CatchupBatch,
                    records = page.items.len(),
                    max_timestamp = current.max_timestamp,
                    "batch delivered"
                );
            }

            match page.last_evaluated {
                Some(key) => start = Some(key),
                None => break,
            }
        }

        report.checkpoint = Some(current);
        Ok(())
    }

    fn advance_if_stalled(
        &self,
        checkpoint: Checkpoint,
        report: &mut SyncReport,
    ) -> IngestResult<Checkpoint> {
        let today = self.clock.today();
        if today <= checkpoint.max_capture_date {
            return Ok(checkpoint);
        }

        let advanced = checkpoint.with_capture_date(today);
        self.persist(&advanced, report)?;
        self.metrics.increment_stall_advances();
        report.stall_advanced = true;

        info!(
            event = %Event::PartitionStallAdvanced,
            from = %checkpoint.max_capture_date,
            to = %today,
            "no new records, checkpoint moved to today"
        );
        Ok(advanced)
    }

    /// Feed a batch to the sink; returns the highest position in it.
    ///
    /// Skipped records still count toward the position so a bad record is
    /// not re-read forever.
    fn deliver(&self, items: &[Record], report: &mut SyncReport) -> IngestResult<Option<Checkpoint>> {
        let mut batch_max: Option<Checkpoint> = None;

        for record in items {
            match self.sink.process(record) {
                Ok(()) => {
                    report.delivered += 1;
                    self.metrics.add_records_delivered(1);
                }
                Err(SinkError::Malformed { id, reason }) => {
                    report.skipped += 1;
                    self.metrics.increment_records_skipped();
                    warn!(event = %Event::RecordSkipped, id = %id, reason = %reason, "record skipped");
                }
                Err(err) => return Err(err.into()),
            }

            let position = Checkpoint::at(record);
            batch_max = Some(batch_max.map_or(position, |m| m.advance(position)));
        }

        Ok(batch_max)
    }

    fn persist(&self, checkpoint: &Checkpoint, report: &mut SyncReport) -> IngestResult<()> {
        self.checkpoints.persist(checkpoint)?;
        self.metrics.increment_checkpoints_persisted();
        report.checkpoints_persisted += 1;
        Ok(())
    }

    /// Poll until a shutdown signal arrives.
    ///
    /// Each cycle runs on a blocking worker. The signal is honoured between
    /// cycles; a cycle in flight finishes first (a bootstrap still in its
    /// grace period is abandoned). Failed cycles are logged and the loop
    /// carries on.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            event = %Event::IngestLoopStart,
            poll_interval_secs = self.config.poll_interval_secs,
            "ingestion loop started"
        );

        loop {
            let engine = self.clone();
            let mut task = tokio::task::spawn_blocking(move || engine.sync_once());

            let mut stopping = false;
            let joined = tokio::select! {
                joined = &mut task => joined,
                _ = shutdown.recv() => {
                    info!(event = %Event::ShutdownStart, "shutdown requested, finishing current cycle");
                    stopping = true;
                    self.request_abort();
                    task.await
                }
            };

            if let Err(err) = joined {
                self.metrics.increment_ingest_failures();
                error!(
                    event = %Event::IngestCycleFailed,
                    error = %IngestError::Worker(err.to_string()),
                    "sync worker did not complete"
                );
            }

            if stopping {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = shutdown.recv() => {
                    info!(event = %Event::ShutdownStart, "shutdown requested");
                    break;
                }
            }
        }

        info!(event = %Event::ShutdownComplete, "ingestion loop stopped");
    }
}
