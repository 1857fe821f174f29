//! Pagination walk tests
//!
//! Covers:
//! - Rollover into the previous day for older walks
//! - No forward rollover for newer walks
//! - Page boundaries between records sharing a sort key
//! - Filter over-fetch filling a page from one query
//! - Termination guards under hopeless filters
//! - Store errors aborting the request

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use captureline::clock::FixedClock;
use captureline::config::PaginationConfig;
use captureline::filter::FilterCatalog;
use captureline::pagination::{
    Cursor, Direction, PageRequest, PaginationAggregator, PaginationError, StopReason,
};
use captureline::store::{
    MemoryPartitionedStore, Page, PartitionKey, PartitionedStore, QueryRequest, Record,
    ScanRequest, StoreError, StoreResult,
};
use chrono::NaiveDate;

const CAMERA_INFO: &str = r#"{
    "cameras": {"driveway": {"location": "front"}},
    "filters": {
        "driveway": {"operator": "contains", "value": "driveway"},
        "indoor": {"operator": "in", "value": ["kitchen", "hall"]}
    }
}"#;

// =============================================================================
// Test Utilities
// =============================================================================

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

fn record(d: u32, ts: i64, camera: &str) -> Record {
    Record::new(format!("{}-{}", d, ts), camera, day(d), ts)
}

/// Store wrapper that remembers every partition queried
#[derive(Debug)]
struct RecordingStore {
    inner: MemoryPartitionedStore,
    queried: Mutex<Vec<PartitionKey>>,
    fail_after: Option<usize>,
    calls: AtomicUsize,
}

impl RecordingStore {
    fn new(records: Vec<Record>) -> Self {
        Self {
            inner: MemoryPartitionedStore::from_records(records),
            queried: Mutex::new(Vec::new()),
            fail_after: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_after(mut self, queries: usize) -> Self {
        self.fail_after = Some(queries);
        self
    }

    fn queried(&self) -> Vec<PartitionKey> {
        self.queried.lock().unwrap().clone()
    }
}

impl PartitionedStore for RecordingStore {
    fn query(&self, request: &QueryRequest) -> StoreResult<Page> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| call >= n) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.queried.lock().unwrap().push(request.partition.clone());
        self.inner.query(request)
    }

    fn scan(&self, request: &ScanRequest) -> StoreResult<Page> {
        self.inner.scan(request)
    }
}

fn aggregator(store: Arc<RecordingStore>, config: PaginationConfig) -> PaginationAggregator {
    let catalog = FilterCatalog::from_json(CAMERA_INFO).unwrap();
    PaginationAggregator::new(store, Arc::new(catalog), config)
        .with_clock(Arc::new(FixedClock::new(day(3))))
}

fn sort_keys(items: &[Record]) -> Vec<i64> {
    items.iter().map(|r| r.sort_key).collect()
}

// =============================================================================
// Rollover pagination
// =============================================================================

fn two_days() -> Vec<Record> {
    let mut records: Vec<Record> = (1..=3).map(|i| record(3, 3000 + i, "porch")).collect();
    records.extend((1..=10).map(|i| record(2, 2000 + i, "porch")));
    records
}

#[test]
fn test_older_walk_rolls_into_previous_day() {
    let store = Arc::new(RecordingStore::new(two_days()));
    let agg = aggregator(store.clone(), PaginationConfig::default());

    let response = agg
        .fetch(&PageRequest::date(Some(day(3))).num_results(5).older_than(3004))
        .unwrap();

    assert_eq!(response.count, 5);
    assert_eq!(sort_keys(&response.items), vec![3003, 3002, 3001, 2010, 2009]);
    assert_eq!(
        response.last_evaluated_key,
        Some(Cursor::new(Direction::Older, PartitionKey::Date(day(2)), Some(2009)).with_id("2-2009"))
    );
    assert_eq!(
        store.queried(),
        vec![PartitionKey::Date(day(3)), PartitionKey::Date(day(2))]
    );
}

#[test]
fn test_cursor_continues_inside_rolled_over_day() {
    let agg = aggregator(Arc::new(RecordingStore::new(two_days())), PaginationConfig::default());

    let first = agg.fetch(&PageRequest::date(None).num_results(5)).unwrap();
    let cursor = first.last_evaluated_key.unwrap();
    let second = agg
        .fetch(&PageRequest::date(None).num_results(5).cursor(cursor))
        .unwrap();

    assert_eq!(sort_keys(&second.items), vec![2008, 2007, 2006, 2005, 2004]);
}

#[test]
fn test_token_round_trip_through_request_parameters() {
    let agg = aggregator(Arc::new(RecordingStore::new(two_days())), PaginationConfig::default());
    let config = agg.config().clone();

    let params: HashMap<String, String> = [("date", "2024-05-03"), ("num_results", "4")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let first = agg.fetch(&PageRequest::parse(&params, &config).unwrap()).unwrap();

    let body = serde_json::to_value(&first).unwrap();
    assert_eq!(body["Count"], 4);
    assert_eq!(body["LastEvaluatedKey"]["capture_date"], "2024-05-02");
    assert_eq!(body["LastEvaluatedKey"]["event_ts"], 2010);

    let mut params = params;
    params.insert("cursor".into(), first.next_cursor.unwrap());
    let second = agg.fetch(&PageRequest::parse(&params, &config).unwrap()).unwrap();

    assert_eq!(sort_keys(&second.items), vec![2009, 2008, 2007, 2006]);
}

// =============================================================================
// Equal sort keys
// =============================================================================

fn same_second() -> Vec<Record> {
    vec![
        Record::new("a", "porch", day(3), 100),
        Record::new("b", "yard", day(3), 100),
        Record::new("c", "porch", day(3), 90),
    ]
}

fn walk_ids(agg: &PaginationAggregator, first: PageRequest, page_size: usize) -> Vec<String> {
    let mut ids = Vec::new();
    let mut request = first;
    loop {
        let response = agg.fetch(&request).unwrap();
        ids.extend(response.items.into_iter().map(|r| r.id));
        match response.last_evaluated_key {
            Some(cursor) => {
                request = PageRequest::date(Some(day(3)))
                    .num_results(page_size)
                    .cursor(cursor)
            }
            None => return ids,
        }
    }
}

#[test]
fn test_page_boundary_inside_equal_sort_keys_loses_nothing() {
    let config = PaginationConfig {
        earliest_date: Some(day(3)),
        ..PaginationConfig::default()
    };
    let agg = aggregator(Arc::new(RecordingStore::new(same_second())), config);

    let first = agg.fetch(&PageRequest::date(Some(day(3))).num_results(1)).unwrap();
    assert_eq!(first.items[0].id, "b");
    let cursor = first.last_evaluated_key.unwrap();
    assert_eq!(cursor.id.as_deref(), Some("b"));

    let rest = agg
        .fetch(&PageRequest::date(Some(day(3))).num_results(5).cursor(cursor))
        .unwrap();
    let ids: Vec<&str> = rest.items.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert!(rest.is_exhausted());
}

#[test]
fn test_single_item_pages_visit_every_tied_record_once() {
    let config = PaginationConfig {
        earliest_date: Some(day(3)),
        ..PaginationConfig::default()
    };
    let agg = aggregator(Arc::new(RecordingStore::new(same_second())), config);

    let older = walk_ids(&agg, PageRequest::date(Some(day(3))).num_results(1), 1);
    assert_eq!(older, vec!["b", "a", "c"]);

    let newer = walk_ids(&agg, PageRequest::date(Some(day(3))).num_results(1).newer_than(0), 1);
    assert_eq!(newer, vec!["c", "a", "b"]);
}

// =============================================================================
// No forward rollover
// =============================================================================

#[test]
fn test_newer_walk_never_queries_later_day() {
    let mut records: Vec<Record> = (1..=5).map(|i| record(3, 3000 + i, "porch")).collect();
    records.push(record(4, 4001, "porch"));
    let store = Arc::new(RecordingStore::new(records));
    let agg = aggregator(store.clone(), PaginationConfig::default());

    let response = agg
        .fetch(&PageRequest::date(Some(day(3))).num_results(5).newer_than(3003))
        .unwrap();

    assert_eq!(sort_keys(&response.items), vec![3004, 3005]);
    assert!(response.last_evaluated_key.is_none());
    assert!(response.next_cursor.is_none());
    assert!(!store.queried().contains(&PartitionKey::Date(day(4))));

    let body = serde_json::to_value(&response).unwrap();
    assert!(body.get("LastEvaluatedKey").is_none());
}

// =============================================================================
// Filter over-fetch
// =============================================================================

#[test]
fn test_filter_fills_page_from_single_query() {
    let records = (0..200)
        .map(|i| {
            let camera = if i % 40 == 7 { "driveway" } else { "backyard" };
            record(3, 10_000 + i, camera)
        })
        .collect();
    let config = PaginationConfig {
        filter_page_size: 200,
        ..PaginationConfig::default()
    };
    let agg = aggregator(Arc::new(RecordingStore::new(records)), config);

    let response = agg
        .fetch(&PageRequest::date(None).num_results(5).filter("driveway"))
        .unwrap();

    assert_eq!(response.count, 5);
    assert_eq!(response.store_requests, 1);
    assert!(response.items.iter().all(|r| r.entity == "driveway"));
}

#[test]
fn test_in_filter_selects_listed_cameras() {
    let records = vec![
        record(3, 1, "kitchen"),
        record(3, 2, "porch"),
        record(3, 3, "hall"),
    ];
    let agg = aggregator(Arc::new(RecordingStore::new(records)), PaginationConfig::default());

    let response = agg
        .fetch(&PageRequest::date(None).num_results(10).filter("indoor"))
        .unwrap();

    assert_eq!(sort_keys(&response.items), vec![3, 1]);
}

// =============================================================================
// Guards
// =============================================================================

#[test]
fn test_hopeless_filter_terminates_with_cursor() {
    let records = (1..=3)
        .flat_map(|d| (0..30).map(move |i| record(d, i64::from(d) * 100 + i, "backyard")))
        .collect();
    let config = PaginationConfig {
        filter_page_size: 10,
        max_store_requests: 5,
        ..PaginationConfig::default()
    };
    let store = Arc::new(RecordingStore::new(records));
    let agg = aggregator(store.clone(), config);

    let response = agg
        .fetch(&PageRequest::date(None).num_results(5).filter("driveway"))
        .unwrap();

    assert_eq!(response.count, 0);
    assert_eq!(response.stop_reason, StopReason::RequestGuard);
    assert_eq!(store.queried().len(), 5);
    assert!(response.last_evaluated_key.is_some());
}

#[test]
fn test_empty_history_stops_at_partition_walk_guard() {
    let agg = aggregator(Arc::new(RecordingStore::new(Vec::new())), PaginationConfig::default());

    let response = agg.fetch(&PageRequest::date(None)).unwrap();

    assert_eq!(response.stop_reason, StopReason::PartitionGuard);
    assert_eq!(response.store_requests, 8);
    assert_eq!(
        response.last_evaluated_key,
        Some(Cursor::new(
            Direction::Older,
            PartitionKey::Date(NaiveDate::from_ymd_opt(2024, 4, 25).unwrap()),
            None
        ))
    );
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_store_error_discards_partial_page() {
    let store = Arc::new(RecordingStore::new(two_days()).failing_after(1));
    let agg = aggregator(store, PaginationConfig::default());

    let err = agg.fetch(&PageRequest::date(None).num_results(5)).unwrap_err();

    assert!(matches!(err, PaginationError::Store(StoreError::Unavailable(_))));
    assert!(!err.is_caller_error());
}

#[test]
fn test_unknown_filter_rejected_before_querying() {
    let store = Arc::new(RecordingStore::new(two_days()));
    let agg = aggregator(store.clone(), PaginationConfig::default());

    let err = agg.fetch(&PageRequest::date(None).filter("garage")).unwrap_err();

    assert!(matches!(err, PaginationError::Filter(_)));
    assert!(store.queried().is_empty());
}
