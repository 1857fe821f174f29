//! # Pagination Aggregator
//!
//! Walks one partition at a time until a page is full:
//!
//! ```text
//! query(partition, range, limit) ──► filter ──► accumulate
//!        ▲                                          │
//!        ├── continuation ◄─────────────────────────┤ short
//!        └── previous day  ◄── older + date, no continuation
//! ```
//!
//! `newer` walks and entity walks never leave their partition. Two guards
//! bound the work per call: store queries and day rollovers. A guard stop
//! returns what was gathered plus a cursor to resume from.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::cursor::{Cursor, Direction};
use super::errors::{PaginationError, PaginationResult};
use super::request::{Bound, PageRequest, PartitionSelector};
use super::response::{PageResponse, StopReason};
use crate::clock::{Clock, SystemClock};
use crate::config::PaginationConfig;
use crate::filter::{CompiledFilter, FilterCatalog};
use crate::observability::{Event, MetricsRegistry};
use crate::store::{ContinuationKey, PartitionKey, PartitionedStore, QueryRequest, Record};

/// Walk state of one `fetch` call
#[derive(Debug)]
struct Walk {
    direction: Direction,
    partition: PartitionKey,
    /// Exclusive bound inside `partition`
    sort_value: Option<i64>,
    /// Tie-break id at `sort_value`
    bound_id: Option<String>,
    continuation: Option<ContinuationKey>,
    /// `(sort_key, id)` of the last record evaluated in `partition`
    last: Option<(i64, String)>,
    items: Vec<Record>,
    store_requests: usize,
    rollovers: usize,
}

impl Walk {
    /// Position to resume from, just past everything evaluated so far
    fn position(&self) -> Cursor {
        let (sort_value, id) = match &self.last {
            Some((sort_key, id)) => (Some(*sort_key), Some(id.clone())),
            None => (self.sort_value, self.bound_id.clone()),
        };
        Cursor {
            direction: self.direction,
            partition: self.partition.clone(),
            sort_value,
            id,
        }
    }

    /// Start over at the beginning of another day
    fn move_to(&mut self, date: NaiveDate) {
        self.partition = PartitionKey::Date(date);
        self.sort_value = None;
        self.bound_id = None;
        self.last = None;
    }
}

/// Cursor-paginated reads over a partitioned store.
///
/// Cloning is cheap; clones share the store, filter catalog and metrics.
#[derive(Debug, Clone)]
pub struct PaginationAggregator {
    store: Arc<dyn PartitionedStore>,
    filters: Arc<FilterCatalog>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsRegistry>,
    config: PaginationConfig,
}

impl PaginationAggregator {
    pub fn new(
        store: Arc<dyn PartitionedStore>,
        filters: Arc<FilterCatalog>,
        config: PaginationConfig,
    ) -> Self {
        Self {
            store,
            filters,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(MetricsRegistry::new()),
            config,
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

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Gather one page
    pub fn fetch(&self, request: &PageRequest) -> PaginationResult<PageResponse> {
        let start = Instant::now();
        self.metrics.increment_page_requests();
        debug!(
            event = %Event::PageRequestBegin,
            selector = ?request.selector,
            num_results = request.num_results,
            filter = ?request.filter,
            "page request"
        );

        match self.walk(request) {
            Ok(response) => {
                info!(
                    event = %Event::PageRequestComplete,
                    count = response.count,
                    store_requests = response.store_requests,
                    stop = ?response.stop_reason,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "page request complete"
                );
                Ok(response)
            }
            Err(e) => {
                self.metrics.increment_page_requests_failed();
                warn!(
                    event = %Event::PageRequestFailed,
                    error = %e,
                    caller_error = e.is_caller_error(),
                    "page request failed"
                );
                Err(e)
            }
        }
    }

    fn walk(&self, request: &PageRequest) -> PaginationResult<PageResponse> {
        if request.num_results == 0 {
            return Err(PaginationError::invalid("num_results", "must be at least 1"));
        }

        let filter = request
            .filter
            .as_deref()
            .map(|name| self.filters.get(name))
            .transpose()?;

        let mut walk = self.start(request)?;
        let stop = loop {
            if walk.store_requests >= self.config.max_store_requests {
                self.metrics.increment_guard_stops();
                warn!(
                    event = %Event::PaginationGuardReached,
                    guard = "store_requests",
                    limit = self.config.max_store_requests,
                    gathered = walk.items.len(),
                    "store request guard reached"
                );
                break StopReason::RequestGuard;
            }

            let remaining = request.num_results - walk.items.len();
            let page = self.store.query(
                &QueryRequest::new(walk.partition.clone())
                    .range(walk.direction.range(walk.sort_value, walk.bound_id.as_deref()))
                    .direction(walk.direction.scan_direction())
                    .limit(self.query_limit(filter, remaining))
                    .start_after(walk.continuation.take()),
            )?;
            walk.store_requests += 1;

            let page_len = page.items.len();
            let mut consumed = 0;
            for record in page.items {
                consumed += 1;
                walk.last = Some((record.sort_key, record.id.clone()));
                if filter.map_or(true, |f| f.matches(&record)) {
                    walk.items.push(record);
                }
                if walk.items.len() == request.num_results {
                    break;
                }
            }

            if walk.items.len() == request.num_results {
                let drained = consumed == page_len && page.last_evaluated.is_none();
                if drained && self.previous_partition(&walk).is_none() {
                    break StopReason::Exhausted;
                }
                break StopReason::Filled;
            }

            if page.last_evaluated.is_some() {
                walk.continuation = page.last_evaluated;
                continue;
            }

            let Some(previous) = self.previous_partition(&walk) else {
                break StopReason::Exhausted;
            };

            if walk.rollovers >= self.config.max_partition_walk {
                self.metrics.increment_guard_stops();
                warn!(
                    event = %Event::PaginationGuardReached,
                    guard = "partition_walk",
                    limit = self.config.max_partition_walk,
                    gathered = walk.items.len(),
                    "partition walk guard reached"
                );
                walk.move_to(previous);
                break StopReason::PartitionGuard;
            }

            debug!(
                event = %Event::PartitionRollover,
                from = %walk.partition,
                to = %previous,
                "rolling over to previous day"
            );
            walk.move_to(previous);
            walk.rollovers += 1;
        };

        self.metrics.add_store_queries(walk.store_requests as u64);
        self.metrics.add_partition_rollovers(walk.rollovers as u64);

        let last_evaluated_key = match stop {
            StopReason::Exhausted => None,
            _ => Some(walk.position()),
        };
        let next_cursor = last_evaluated_key
            .as_ref()
            .map(Cursor::to_token)
            .transpose()?;

        Ok(PageResponse {
            count: walk.items.len(),
            items: walk.items,
            last_evaluated_key,
            next_cursor,
            store_requests: walk.store_requests,
            stop_reason: stop,
        })
    }

    /// Starting partition, direction and bound
    fn start(&self, request: &PageRequest) -> PaginationResult<Walk> {
        let selected = request.selector.partition(self.clock.today());

        let (direction, partition, sort_value, bound_id) = match &request.bound {
            None => (Direction::Older, selected, None, None),
            Some(Bound::Timestamp {
                direction,
                sort_value,
            }) => (*direction, selected, Some(*sort_value), None),
            Some(Bound::Cursor(cursor)) => {
                check_cursor(&request.selector, cursor)?;
                (
                    cursor.direction,
                    cursor.partition.clone(),
                    cursor.sort_value,
                    cursor.id.clone(),
                )
            }
        };

        Ok(Walk {
            direction,
            partition,
            sort_value,
            bound_id,
            continuation: None,
            last: None,
            items: Vec::new(),
            store_requests: 0,
            rollovers: 0,
        })
    }

    /// Raw items to ask for. A filter over-fetches by the configured page size.
    fn query_limit(&self, filter: Option<&CompiledFilter>, remaining: usize) -> usize {
        match filter {
            Some(_) => self.config.filter_page_size.max(remaining),
            None => remaining,
        }
    }

    /// Day an `older` date walk rolls over to, if any
    fn previous_partition(&self, walk: &Walk) -> Option<NaiveDate> {
        if walk.direction != Direction::Older {
            return None;
        }
        let previous = walk.partition.as_date()?.pred_opt()?;
        match self.config.earliest_date {
            Some(floor) if previous < floor => None,
            _ => Some(previous),
        }
    }
}

/// A cursor must address the partition kind the request selects
fn check_cursor(selector: &PartitionSelector, cursor: &Cursor) -> PaginationResult<()> {
    match (selector, &cursor.partition) {
        (PartitionSelector::Date(_), PartitionKey::Date(_)) => Ok(()),
        (PartitionSelector::Entity(name), PartitionKey::Entity(other)) if name == other => Ok(()),
        (PartitionSelector::Entity(name), PartitionKey::Entity(other)) => {
            Err(PaginationError::MalformedCursor(format!(
                "cursor is for camera {:?}, request selects {:?}",
                other, name
            )))
        }
        _ => Err(PaginationError::MalformedCursor(
            "cursor partition kind does not match the request".into(),
        )),
    }
}
