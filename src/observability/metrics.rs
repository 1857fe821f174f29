//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters shared by the ingestion loop and the aggregator.
///
/// Relaxed ordering is sufficient; counters are read for reporting only.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    ingest_cycles: AtomicU64,
    ingest_failures: AtomicU64,
    bootstraps: AtomicU64,
    records_delivered: AtomicU64,
    records_skipped: AtomicU64,
    checkpoints_persisted: AtomicU64,
    stall_advances: AtomicU64,
    page_requests: AtomicU64,
    page_requests_failed: AtomicU64,
    store_queries: AtomicU64,
    partition_rollovers: AtomicU64,
    guard_stops: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Ingestion

    pub fn increment_ingest_cycles(&self) {
        self.ingest_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_ingest_failures(&self) {
        self.ingest_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_bootstraps(&self) {
        self.bootstraps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_records_delivered(&self, count: u64) {
        self.records_delivered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_records_skipped(&self) {
        self.records_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_checkpoints_persisted(&self) {
        self.checkpoints_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_stall_advances(&self) {
        self.stall_advances.fetch_add(1, Ordering::Relaxed);
    }

    // Pagination

    pub fn increment_page_requests(&self) {
        self.page_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_page_requests_failed(&self) {
        self.page_requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_store_queries(&self, count: u64) {
        self.store_queries.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_partition_rollovers(&self, count: u64) {
        self.partition_rollovers.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_guard_stops(&self) {
        self.guard_stops.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ingest_cycles: self.ingest_cycles.load(Ordering::Relaxed),
            ingest_failures: self.ingest_failures.load(Ordering::Relaxed),
            bootstraps: self.bootstraps.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            checkpoints_persisted: self.checkpoints_persisted.load(Ordering::Relaxed),
            stall_advances: self.stall_advances.load(Ordering::Relaxed),
            page_requests: self.page_requests.load(Ordering::Relaxed),
            page_requests_failed: self.page_requests_failed.load(Ordering::Relaxed),
            store_queries: self.store_queries.load(Ordering::Relaxed),
            partition_rollovers: self.partition_rollovers.load(Ordering::Relaxed),
            guard_stops: self.guard_stops.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ingest_cycles: u64,
    pub ingest_failures: u64,
    pub bootstraps: u64,
    pub records_delivered: u64,
    pub records_skipped: u64,
    pub checkpoints_persisted: u64,
    pub stall_advances: u64,
    pub page_requests: u64,
    pub page_requests_failed: u64,
    pub store_queries: u64,
    pub partition_rollovers: u64,
    pub guard_stops: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_ingest_cycles();
        registry.add_records_delivered(3);
        registry.add_records_delivered(2);
        registry.increment_records_skipped();
        registry.add_store_queries(4);
        registry.add_partition_rollovers(1);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.ingest_cycles, 1);
        assert_eq!(snapshot.records_delivered, 5);
        assert_eq!(snapshot.records_skipped, 1);
        assert_eq!(snapshot.store_queries, 4);
        assert_eq!(snapshot.partition_rollovers, 1);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_checkpoints_persisted();

        let parsed: serde_json::Value = serde_json::from_str(&registry.to_json()).unwrap();
        assert_eq!(parsed["checkpoints_persisted"], 1);
        assert_eq!(parsed["guard_stops"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_page_requests();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.snapshot().page_requests, 800);
    }
}
